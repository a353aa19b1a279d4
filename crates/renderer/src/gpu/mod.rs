mod context;
mod pipeline;
mod slots;
mod state;
mod uniforms;

pub(crate) use state::GpuState;
