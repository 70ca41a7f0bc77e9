//! # Repository Module
//!
//! Database repository implementations for Stockroom.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  HTTP handler                                                           │
//! │       │                                                                 │
//! │       │  db.products().search_by_name("kopi")                           │
//! │       ▼                                                                 │
//! │  ProductRepository                                                      │
//! │  ├── list / search_by_name / list_by_category                           │
//! │  ├── get(&self, id)                                                     │
//! │  ├── create(&self, new)                                                 │
//! │  ├── update(&self, id, partial)                                         │
//! │  └── delete(&self, id)                                                  │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! │                                                                         │
//! │  Statements that must also run inside a checkout unit are free          │
//! │  functions generic over the executor, shared with `unit`.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`category::CategoryRepository`] - Category CRUD
//! - [`product::ProductRepository`] - Product CRUD and search
//! - [`transaction::TransactionRepository`] - Transaction lookup and report aggregates

pub mod category;
pub mod product;
pub mod transaction;
