//! An in-memory host for driving the shell from tests.

use std::collections::VecDeque;

use super::{InputLine, IoError, IoHost, Output, OutputStyle, PromptConfig, Signal};

/// Queued input and signals in, buffered output out.
///
/// When both queues are empty the host reports end of input, so a test that
/// forgets `exit` still terminates.
#[derive(Debug, Default)]
pub struct TestHost {
    inputs: VecDeque<String>,
    signals: VecDeque<Signal>,
    outputs: Vec<Output>,
    prompts: Vec<PromptConfig>,
    flushes: usize,
}

impl TestHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// A host that will type `lines` in order.
    pub fn with_inputs(lines: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let mut host = Self::new();
        for line in lines {
            host.queue_input(line);
        }
        host
    }

    pub fn queue_input(&mut self, line: impl Into<String>) {
        self.inputs.push_back(line.into());
    }

    pub fn queue_signal(&mut self, signal: Signal) {
        self.signals.push_back(signal);
    }

    pub fn output(&self) -> &[Output] {
        &self.outputs
    }

    /// All output text concatenated.
    pub fn output_text(&self) -> String {
        self.outputs.iter().map(|o| o.text.as_str()).collect()
    }

    pub fn output_with_style(&self, style: OutputStyle) -> Vec<&str> {
        self.outputs
            .iter()
            .filter(|o| o.style == style)
            .map(|o| o.text.as_str())
            .collect()
    }

    pub fn errors(&self) -> Vec<&str> {
        self.output_with_style(OutputStyle::Error)
    }

    /// Every prompt the core asked for, oldest first.
    pub fn prompts(&self) -> &[PromptConfig] {
        &self.prompts
    }

    pub fn flush_count(&self) -> usize {
        self.flushes
    }
}

impl IoHost for TestHost {
    fn wait_for_input(&mut self) -> Result<(), IoError> {
        if self.inputs.is_empty() && self.signals.is_empty() {
            self.signals.push_back(Signal::Eof);
        }
        Ok(())
    }

    fn read_input(&mut self) -> Result<Option<InputLine>, IoError> {
        Ok(self.inputs.pop_front().map(|line| InputLine { line }))
    }

    fn read_signal(&mut self) -> Result<Option<Signal>, IoError> {
        Ok(self.signals.pop_front())
    }

    fn write_output(&mut self, output: Output) -> Result<(), IoError> {
        self.outputs.push(output);
        Ok(())
    }

    fn write_prompt(&mut self, config: PromptConfig) -> Result<(), IoError> {
        self.prompts.push(config);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), IoError> {
        self.flushes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inputs_come_out_in_order() {
        let mut host = TestHost::with_inputs(["first", "second"]);

        host.wait_for_input().unwrap();
        assert_eq!(host.read_input().unwrap().unwrap().line, "first");
        host.wait_for_input().unwrap();
        assert_eq!(host.read_input().unwrap().unwrap().line, "second");
        assert!(host.read_signal().unwrap().is_none());
    }

    #[test]
    fn empty_host_signals_eof() {
        let mut host = TestHost::new();
        host.wait_for_input().unwrap();
        assert!(matches!(host.read_signal().unwrap(), Some(Signal::Eof)));
    }

    #[test]
    fn queued_signal_is_not_doubled() {
        let mut host = TestHost::new();
        host.queue_signal(Signal::Interrupt);
        host.wait_for_input().unwrap();
        assert!(matches!(host.read_signal().unwrap(), Some(Signal::Interrupt)));
        assert!(host.read_signal().unwrap().is_none());
    }

    #[test]
    fn output_is_filtered_by_style() {
        let mut host = TestHost::new();
        host.write_output(Output::normal("ok\n")).unwrap();
        host.write_output(Output::error("bad")).unwrap();
        host.write_output(Output::program("8\n")).unwrap();

        assert_eq!(host.errors(), vec!["bad"]);
        assert_eq!(host.output_with_style(OutputStyle::Program), vec!["8\n"]);
        assert_eq!(host.output_text(), "ok\nbad8\n");
    }

    #[test]
    fn prompts_and_flushes_are_recorded() {
        let mut host = TestHost::new();
        host.write_prompt(PromptConfig {
            running: 2,
            free_space: 100,
        })
        .unwrap();
        host.flush().unwrap();

        assert_eq!(host.prompts()[0].running, 2);
        assert_eq!(host.flush_count(), 1);
    }
}
