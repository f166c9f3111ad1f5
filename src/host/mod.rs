//! Collaborators supplied by the embedding editor.

pub mod collab;
