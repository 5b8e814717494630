use crate::discovery::DiscoveryResult;
use crate::report::Sink;
use crate::Result;
use async_trait::async_trait;
use std::io::Write;
use std::sync::Mutex;

/// Writes each result as an indented JSON document.
pub struct LocalSink {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl LocalSink {
    pub fn new<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            writer: Mutex::new(Box::new(writer)),
        }
    }

    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

#[async_trait]
impl Sink for LocalSink {
    fn name(&self) -> &str {
        "stdout"
    }

    async fn deliver(&self, result: &DiscoveryResult) -> Result<()> {
        let document = serde_json::to_string_pretty(result)?;

        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        writeln!(writer, "{}", document)?;
        writer.flush()?;

        Ok(())
    }
}
