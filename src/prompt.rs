//! User-interaction interface injected into the tree walker (spec §9,
//! "Prompting mid-traversal") so tests can supply scripted responses instead
//! of reading stdin.

use std::io::{self, Write};

/// Asks the user a yes/no question and returns whether they said yes.
pub trait Prompter {
    fn ask(&self, prompt: &str) -> bool;
}

/// Default `Prompter`: writes the prompt to stdout and reads a line from
/// stdin. Any answer beginning with `y` or `Y` is yes.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn ask(&self, prompt: &str) -> bool {
        print!("{prompt}");
        if io::stdout().flush().is_err() {
            return false;
        }
        let mut line = String::new();
        match io::stdin().read_line(&mut line) {
            Ok(0) => false,
            Ok(_) => matches!(line.chars().next(), Some('y') | Some('Y')),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
pub(crate) mod scripted {
    use super::Prompter;
    use std::cell::RefCell;

    /// Test-only `Prompter` that returns a fixed, scripted sequence of
    /// answers, one per call, panicking if exhausted.
    pub(crate) struct ScriptedPrompter {
        answers: RefCell<std::vec::IntoIter<bool>>,
    }

    impl ScriptedPrompter {
        pub(crate) fn new(answers: Vec<bool>) -> Self {
            Self {
                answers: RefCell::new(answers.into_iter()),
            }
        }
    }

    impl Prompter for ScriptedPrompter {
        fn ask(&self, _prompt: &str) -> bool {
            self.answers
                .borrow_mut()
                .next()
                .expect("scripted prompter ran out of answers")
        }
    }
}
