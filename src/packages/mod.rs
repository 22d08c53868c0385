// src/packages/mod.rs

//! Host package manager support
//!
//! Each supported package manager implements the `PkgManager` trait.
//! Currently only RPM is supported.

pub mod info;
pub mod rpm;
pub mod traits;

pub use info::PkgInfo;
pub use rpm::RpmPkgManager;
pub use traits::PkgManager;
