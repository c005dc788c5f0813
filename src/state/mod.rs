/// State management module
///
/// This module handles all persistent and shared state, including:
/// - Shared data structures (data.rs)
/// - The document store seam and its SQLite backend (documents.rs)
/// - The Firestore backend (firestore.rs)
/// - Saved-image persistence on top of a document store (gallery.rs)

pub mod data;
pub mod documents;
pub mod firestore;
pub mod gallery;
