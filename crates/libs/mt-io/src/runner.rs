//! Process runner with captured output.

use std::{
    io::Read,
    process::{Command, ExitStatus, Stdio},
    sync::mpsc::{Sender, channel},
    thread::{self, JoinHandle},
};

use crate::prelude::*;

/// Events emitted during process execution.
#[derive(Debug, PartialEq)]
pub enum RunEvent {
    /// Process was successfully created.
    ProcessCreated,
    /// New output chunk from stdout or stderr.
    ProcessOutput(String),
    /// Process ended (true = success, false = failure).
    ProcessEnd(bool),
}

/// A single external command with its arguments.
pub struct Runner {
    command: String,
    args: Vec<String>,
}

/// Combined result of a finished process.
#[derive(Debug)]
pub struct RunOutput {
    pub status: ExitStatus,
    /// Interleaved stdout + stderr, as read.
    pub output: String,
}

impl RunOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Last portion of the output, for error messages.
    pub fn tail(&self, max_chars: usize) -> &str {
        let start = self
            .output
            .char_indices()
            .rev()
            .nth(max_chars.saturating_sub(1))
            .map(|(i, _)| i)
            .unwrap_or(0);
        &self.output[start..]
    }
}

impl Runner {
    /// Create a new runner with command and arguments.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use mt_io::runner::Runner;
    ///
    /// let runner = Runner::new("ls", vec!["-la", "/tmp"]);
    /// assert_eq!(runner.get_full_command(), "ls -la /tmp");
    /// ```
    pub fn new(command: impl Into<String>, args: Vec<impl Into<String>>) -> Self {
        Self {
            command: command.into(),
            args: args.into_iter().map(|a| a.into()).collect(),
        }
    }

    /// Get the full command string with arguments.
    pub fn get_full_command(&self) -> String {
        format!("{} {}", &self.command, &self.args.join(" "))
    }

    fn read_stream<T: Read>(tx: Sender<RunEvent>, mut stream: T) {
        let mut buffer = [0; 1024];
        loop {
            match stream.read(&mut buffer) {
                Ok(0) => break, // EOF
                Ok(n) => {
                    let data = String::from_utf8_lossy(&buffer[..n]);
                    let _ = tx.send(RunEvent::ProcessOutput(data.to_string()));
                }
                Err(_) => break,
            }
        }
    }

    fn launch_stream_reader<T>(tx: Sender<RunEvent>, stream: T) -> JoinHandle<()>
    where
        T: Read + Send + 'static,
    {
        thread::spawn(move || Runner::read_stream(tx, stream))
    }

    /// Run the process to completion, emitting events on `tx`.
    pub fn run(&self, tx: Sender<RunEvent>) -> Result<ExitStatus> {
        let mut child = Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| match err.kind() {
                std::io::ErrorKind::NotFound => Error::ToolMissing(self.command.clone()),
                _ => Error::IO(err),
            })?;
        let _ = tx.send(RunEvent::ProcessCreated);

        let mut readers = Vec::new();
        if let Some(stdout) = child.stdout.take() {
            readers.push(Runner::launch_stream_reader(tx.clone(), stdout));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(Runner::launch_stream_reader(tx.clone(), stderr));
        }

        let status = child.wait()?;
        for reader in readers {
            let _ = reader.join();
        }
        let _ = tx.send(RunEvent::ProcessEnd(status.success()));
        Ok(status)
    }

    /// Run the process and collect its output.
    pub fn run_captured(&self) -> Result<RunOutput> {
        let (tx, rx) = channel();
        let status = self.run(tx)?;
        let mut output = String::new();
        while let Ok(event) = rx.try_recv() {
            if let RunEvent::ProcessOutput(chunk) = event {
                output.push_str(&chunk);
            }
        }
        Ok(RunOutput { status, output })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_output_and_status() -> Result<()> {
        let runner = Runner::new("echo", vec!["hello"]);
        let out = runner.run_captured()?;
        assert!(out.success());
        assert!(out.output.contains("hello"));
        Ok(())
    }

    #[test]
    fn missing_tool_is_reported() {
        let runner = Runner::new("definitely-not-a-tool-mt", Vec::<String>::new());
        assert!(matches!(
            runner.run_captured(),
            Err(Error::ToolMissing(_))
        ));
    }

    #[test]
    fn tail_returns_last_chars() {
        let out = RunOutput {
            status: Runner::new("true", Vec::<String>::new())
                .run_captured()
                .unwrap()
                .status,
            output: "abcdef".into(),
        };
        assert_eq!(out.tail(3), "def");
        assert_eq!(out.tail(100), "abcdef");
    }
}
