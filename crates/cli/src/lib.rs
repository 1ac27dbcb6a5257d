// Library half of the devrecon CLI, shared by the binary and its tests.

pub mod pipeline;
