//! Mock implementations of the outbound trait seams, for tests that need
//! full control over hosting-API behavior without network access.

mod mock_contents;
mod mock_source;

pub use mock_contents::MockContentsHost;
pub use mock_source::MockRepoSource;
