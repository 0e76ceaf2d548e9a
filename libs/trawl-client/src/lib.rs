//! HTTP engine handle for trawl views
//!
//! This crate connects [`trawl_core::DocumentView`] to a real
//! Elasticsearch or OpenSearch cluster over its REST API.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use trawl_client::HttpEngine;
//! use trawl_core::{BackendKind, DocumentDescriptor, DocumentView, ViewConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = Arc::new(HttpEngine::with_base_url("http://localhost:9200")?);
//! let config = ViewConfig::new(
//!     DocumentDescriptor::new("books"),
//!     vec![BackendKind::Filtering],
//! );
//! let view = DocumentView::new(config, engine)?;
//! let page = view
//!     .list(&[("state".to_owned(), "published".to_owned())], None)
//!     .await?;
//! println!("{page}");
//! # Ok(())
//! # }
//! ```

pub mod http;

pub use http::{HttpEngine, HttpEngineConfig};
