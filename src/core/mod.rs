pub mod catalog;
pub mod fetcher;
pub mod library;
pub mod publish;
pub mod query;
pub mod renamer;
