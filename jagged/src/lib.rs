pub use jagged_layout::{Backend, HostBackend, Layout, MetaBackend, empty_layout, unproject_layout};
pub use jagged_schema::Schema;
pub use {
    jagged_buffer as buffer, jagged_error as error, jagged_layout as layout, jagged_scan as scan,
    jagged_schema as schema,
};
