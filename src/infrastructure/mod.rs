// Infrastructure for probegraph: input readers, the five probes and the
// external tools they call.

pub mod changes;
pub mod complexity;
pub mod concurrency;
pub mod dependencies;
pub mod dynamic_calls;
pub mod history;
pub mod hotspot;
pub mod profiler;
pub mod project_loader;

pub use changes::{ChangeProbe, StaticHistory};
pub use complexity::ComplexityProbe;
pub use dependencies::DependencyProbe;
pub use dynamic_calls::DynamicCallProbe;
pub use history::GitCli;
pub use hotspot::HotspotProbe;
