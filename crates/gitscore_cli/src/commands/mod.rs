pub(crate) mod meta;
pub(crate) mod output;

#[cfg(any(feature = "github", feature = "gitlab"))]
pub(crate) mod shared;

#[cfg(feature = "github")]
pub(crate) mod github;

#[cfg(feature = "gitlab")]
pub(crate) mod gitlab;
