// Schema-driven résumé segmentation.
// Data flows normalize → anchors → spans → tree → quality, orchestrated by
// `pipeline::segment`. Everything here is synchronous; handlers run it on the
// blocking pool.

pub mod anchors;
pub mod diagnostics;
pub mod handlers;
pub mod headlines;
pub mod heading;
pub mod normalize;
pub mod pipeline;
pub mod quality;
pub mod schema;
pub mod spans;
pub mod tree;
