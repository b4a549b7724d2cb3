use crate::io::IOBundle;
use crate::time_util::mytime::TimeProvider;
use backtrace::Backtrace;
use std::fmt::{Display, Formatter};
use tokio::runtime::Runtime;

pub mod follow_target;
pub mod policy;

/// Something went wrong that polling again won't fix.
#[derive(Debug)]
pub struct BrainFailure {
    description: String,
    trace: Backtrace,
    line_num: u32,
    file_name: String,
}

impl BrainFailure {
    pub fn new(description: String, trace: Backtrace, line_num: u32, file_name: String) -> Self {
        BrainFailure {
            description,
            trace,
            line_num,
            file_name,
        }
    }
}

impl Display for BrainFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "BrainFailure occured: '{}'", self.description)?;
        writeln!(f, "At: Line {} in {}", self.line_num, self.file_name)?;
        writeln!(f, "Trace:{:?}", self.trace)
    }
}

impl std::error::Error for BrainFailure {}

pub trait Brain {
    /// A single poll: look at the thermostat and correct it if needed.
    fn run(
        &mut self,
        runtime: &Runtime,
        io_bundle: &IOBundle,
        time_provider: &impl TimeProvider,
    ) -> Result<(), BrainFailure>;
}

#[macro_export]
macro_rules! brain_fail {
    ($msg:expr) => {{
        let trace = backtrace::Backtrace::new();
        $crate::brain::BrainFailure::new(
            $msg.to_string(),
            trace,
            line!(),
            file!().to_owned(),
        )
    }};
}
