// Embeddings module
// Client for the local Ollama embedding server

pub mod ollama;

pub use ollama::OllamaClient;
