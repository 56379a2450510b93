//! Fixtures shared by the unit tests.

use omni_http::protocol::{CliInput, MemorySink, Output, Transport};
use serde_json::{Map, Value};

use crate::buffer::OutputBuffer;
use crate::config::Config;
use crate::context::Context;

pub(crate) struct Harness {
    pub input: CliInput,
    pub output: Output,
    pub buffer: OutputBuffer,
    pub config: Config,
    pub locals: Map<String, Value>,
    pub sink: MemorySink,
}

impl Harness {
    pub fn cli(args: &[&str]) -> Self {
        let sink = MemorySink::new();
        Self {
            input: CliInput::from_args(args.iter().copied()),
            output: Output::new(Transport::Cli, sink.clone()),
            buffer: OutputBuffer::new(),
            config: Config::new(),
            locals: Map::new(),
            sink,
        }
    }

    pub fn context(&mut self) -> Context<'_> {
        Context::new(&mut self.input, &mut self.output, &mut self.buffer, &self.config, &mut self.locals)
    }
}
