//! Registry of in-flight story assemblies.
//!
//! An [`Assembly`] pairs the identity of a story (its GUID and source) with
//! the [`FragmentBuffer`](crate::fragment::FragmentBuffer) collecting its
//! bytes. The [`AssemblyRegistry`] owns every live assembly, keyed by
//! [`AssemblyKey`], and retires them on completion, failure or staleness.

pub mod key;
pub mod registry;

pub use key::{AssemblyKey, StoryIdentity};
pub use registry::{Assembly, AssemblyRegistry, AssemblyStatus};

#[cfg(test)]
mod tests;
