pub mod branch;
pub mod closure;
pub mod mergeable;
pub mod optimal;
pub mod rejection;
pub mod relation;
pub mod resolver;
pub mod scope;

pub use branch::*;
pub use closure::*;
pub use mergeable::*;
pub use optimal::*;
pub use rejection::*;
pub use relation::*;
pub use resolver::*;
pub use scope::*;
