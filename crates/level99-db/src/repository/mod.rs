//! Repositories, one per table.
//!
//! Each holds a clone of the pool and is obtained from [`crate::Database`]:
//!
//! ```rust,ignore
//! state.db.categories().delete(3).await?;
//! ```
//!
//! - [`category::CategoryRepository`]: CRUD and the in-use deletion guard
//! - [`product::ProductRepository`]: CRUD and the category join
//! - [`user::UserRepository`]: operator accounts and credential checks

pub mod category;
pub mod product;
pub mod user;
