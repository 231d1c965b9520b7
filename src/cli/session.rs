//! Interactive session: menu loop driving the knowledge base
//!
//! All terminal traffic goes through [`Console`], so a scripted console can
//! play whole sessions in tests.

use std::path::PathBuf;

use tracing::{debug, instrument, warn};

use crate::application::{ApplicationError, KnowledgeBase, Outcome, Prompt};
use crate::cli::error::CliResult;
use crate::config::Settings;
use crate::domain::path::{Distinction, Step};
use crate::domain::Answer;
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::traits::Console;
use crate::infrastructure::InfraError;

const MENU: &str = "commands: play, undo, redo, save, load, check, tree, stats, index <question>, compare <a> <b>, quit";

/// Menu entry parsed from one input line.
#[derive(Debug, Clone, PartialEq, Eq)]
enum MenuCommand {
    Play,
    Undo,
    Redo,
    Save,
    Load,
    Check,
    Tree,
    Stats,
    Index(String),
    Compare(String, String),
    Help,
    Quit,
    Unknown(String),
}

impl MenuCommand {
    fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        let cmd = match word.to_ascii_lowercase().as_str() {
            "" => return None,
            "p" | "play" => Self::Play,
            "u" | "undo" => Self::Undo,
            "r" | "redo" => Self::Redo,
            "s" | "save" => Self::Save,
            "l" | "load" => Self::Load,
            "c" | "check" => Self::Check,
            "t" | "tree" => Self::Tree,
            "stats" => Self::Stats,
            "h" | "help" | "?" => Self::Help,
            "q" | "quit" | "exit" => Self::Quit,
            "i" | "index" if !rest.is_empty() => Self::Index(rest.to_string()),
            "compare" => match rest.split_whitespace().collect::<Vec<_>>().as_slice() {
                [a, b] => Self::Compare(a.to_string(), b.to_string()),
                _ => Self::Unknown(line.to_string()),
            },
            _ => Self::Unknown(line.to_string()),
        };
        Some(cmd)
    }
}

fn parse_answer(line: &str) -> Option<Answer> {
    match line.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Some(Answer::Yes),
        "n" | "no" => Some(Answer::No),
        _ => None,
    }
}

/// Human-readable lines for a comparison of two animals.
pub fn describe_distinction(d: &Distinction, first: &str, second: &str) -> Vec<String> {
    fn push_steps(out: &mut Vec<String>, prefix: &str, steps: &[Step]) {
        for step in steps {
            out.push(format!("{}{} -> {}", prefix, step.question, step.answer));
        }
    }

    let mut out = Vec::new();
    if d.shared.is_empty() {
        out.push("no questions in common".to_string());
    } else {
        out.push("both:".to_string());
        push_steps(&mut out, "  ", &d.shared);
    }
    out.push(format!("{}:", first));
    push_steps(&mut out, "  ", &d.first);
    out.push(format!("{}:", second));
    push_steps(&mut out, "  ", &d.second);
    out
}

pub struct Session<'a, C: Console> {
    kb: KnowledgeBase,
    console: &'a mut C,
    data_file: PathBuf,
    autosave: bool,
}

impl<'a, C: Console> Session<'a, C> {
    /// Start a session, loading the knowledge file when configured to.
    pub fn start(
        container: &ServiceContainer,
        data_file: PathBuf,
        console: &'a mut C,
    ) -> CliResult<Self> {
        let settings: &Settings = &container.settings;
        let kb = container
            .knowledge_base()
            .map_err(|e| InfraError::Application(e.into()))?;
        let mut session = Self {
            kb,
            console,
            data_file,
            autosave: settings.autosave,
        };

        if settings.autoload && session.kb.exists(&session.data_file) {
            match session.kb.load(&session.data_file) {
                Ok(n) => session.say(format!("loaded {} nodes", n)),
                Err(e) => {
                    warn!("autoload failed: {}", e);
                    session.say(format!("cannot load {}: {}", session.data_file.display(), e));
                    session.say("starting from the seed tree");
                }
            }
        }
        Ok(session)
    }

    pub fn knowledge_base(&self) -> &KnowledgeBase {
        &self.kb
    }

    fn say(&mut self, line: impl AsRef<str>) {
        self.console.print(line.as_ref());
    }

    fn read(&mut self, prompt: &str) -> CliResult<Option<String>> {
        self.console
            .read_line(prompt)
            .map_err(|e| InfraError::io("read from terminal", e).into())
    }

    /// Ask until a yes/no answer arrives; `None` at end of input.
    fn ask(&mut self, question: &str) -> CliResult<Option<Answer>> {
        loop {
            let Some(line) = self.read(&format!("{} [y/n]", question))? else {
                return Ok(None);
            };
            match parse_answer(&line) {
                Some(answer) => return Ok(Some(answer)),
                None => self.say("please answer y or n"),
            }
        }
    }

    /// Run the menu loop until `quit` or end of input.
    #[instrument(level = "debug", skip(self))]
    pub fn run(&mut self) -> CliResult<()> {
        self.say(MENU);
        while let Some(line) = self.read("twentyq>")? {
            let Some(cmd) = MenuCommand::parse(&line) else {
                continue;
            };
            debug!("menu: {:?}", cmd);
            if !self.dispatch(cmd)? {
                break;
            }
        }
        self.finish()
    }

    /// Returns `false` when the session should end.
    fn dispatch(&mut self, cmd: MenuCommand) -> CliResult<bool> {
        match cmd {
            MenuCommand::Play => return self.play_round(),
            MenuCommand::Undo => {
                if self.kb.undo() {
                    self.say("undone");
                } else {
                    self.say("nothing to undo");
                }
            }
            MenuCommand::Redo => {
                if self.kb.redo() {
                    self.say("redone");
                } else {
                    self.say("nothing to redo");
                }
            }
            MenuCommand::Save => self.save(),
            MenuCommand::Load => match self.kb.load(&self.data_file) {
                Ok(n) => self.say(format!("loaded {} nodes", n)),
                Err(e) => self.report(&e),
            },
            MenuCommand::Check => {
                if self.kb.check_integrity() {
                    self.say("tree is consistent");
                } else {
                    self.say("tree is corrupt");
                }
            }
            MenuCommand::Tree => {
                let rendered = crate::application::render::to_tree_string(self.kb.tree());
                for line in rendered.to_string().lines() {
                    self.say(line);
                }
            }
            MenuCommand::Stats => match self.kb.stats() {
                Ok(s) => self.say(format!(
                    "nodes: {}, questions: {}, leaves: {}, depth: {}",
                    s.nodes, s.questions, s.leaves, s.depth
                )),
                Err(e) => self.report(&ApplicationError::from(e)),
            },
            MenuCommand::Index(question) => {
                let line = match self.kb.animals_for_question(&question) {
                    Some(ids) => format!("ids: {}", itertools::join(ids.iter(), ", ")),
                    None => "question not indexed".to_string(),
                };
                self.say(line);
            }
            MenuCommand::Compare(a, b) => match self.kb.distinguish(&a, &b) {
                Ok(Some(d)) => {
                    for line in describe_distinction(&d, &a, &b) {
                        self.say(line);
                    }
                }
                Ok(None) => self.say(format!("cannot find both {} and {}", a, b)),
                Err(e) => self.report(&ApplicationError::from(e)),
            },
            MenuCommand::Help => self.say(MENU),
            MenuCommand::Quit => return Ok(false),
            MenuCommand::Unknown(line) => self.say(format!("unknown command: {}", line)),
        }
        Ok(true)
    }

    fn save(&mut self) {
        match self.kb.save(&self.data_file) {
            Ok(()) => {
                let msg = format!("saved to {}", self.data_file.display());
                self.say(msg)
            }
            Err(e) => self.report(&e),
        }
    }

    fn report(&mut self, e: &ApplicationError) {
        self.say(format!("error: {}", e));
    }

    fn finish(&mut self) -> CliResult<()> {
        if self.autosave {
            self.save();
        }
        self.say("bye");
        Ok(())
    }

    /// One guessing round; `false` when input ended mid-round.
    #[instrument(level = "debug", skip(self))]
    fn play_round(&mut self) -> CliResult<bool> {
        let mut guess = String::new();
        let mut prompt = self
            .kb
            .begin_traversal()
            .map_err(|e| InfraError::Application(e.into()))?;
        loop {
            let answer = match &prompt {
                Prompt::AskQuestion(q) => self.ask(q)?,
                Prompt::AskIsAnimal(animal) => {
                    guess = animal.clone();
                    self.ask(&format!("Is it a {}?", animal))?
                }
                Prompt::Done(Outcome::Guessed) => {
                    self.say("I guessed it!");
                    return Ok(true);
                }
                Prompt::Done(Outcome::Exhausted) => {
                    self.say("I have nothing left to ask.");
                    return Ok(true);
                }
                Prompt::Done(Outcome::Stumped) => return self.learn(&guess),
            };
            let Some(answer) = answer else {
                return Ok(false);
            };
            prompt = self
                .kb
                .step_traversal(answer)
                .map_err(|e| InfraError::Application(e.into()))?;
        }
    }

    fn learn(&mut self, guess: &str) -> CliResult<bool> {
        self.say("You stumped me!");
        let Some(animal) = self.read("What animal were you thinking of?")? else {
            return Ok(false);
        };
        let Some(question) = self.read(&format!(
            "Give me a question that tells a {} from a {}:",
            animal.trim(),
            guess
        ))?
        else {
            return Ok(false);
        };
        let Some(answer) = self.ask(&format!("For a {}, what is the answer?", animal.trim()))?
        else {
            return Ok(false);
        };

        match self
            .kb
            .submit_wrong_guess(animal.trim(), question.trim(), answer)
        {
            Ok(_) => self.say(format!("Thanks, I learned about the {}.", animal.trim())),
            Err(e) => self.report(&e),
        }
        Ok(true)
    }
}
