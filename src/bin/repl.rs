use std::cell::RefCell;
use std::rc::Rc;

use rustyline::error::ReadlineError;
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Completer, Context, Editor, Helper, Highlighter, Hinter, Validator};

use minilisp::environment::Environment;
use minilisp::evaluator::{evaluate_source, lispify, special_form_identifiers};
use minilisp::lexer::{Token, tokenize};

const HISTORY_FILE: &str = "minilisp_history.txt";

struct LispCompleter {
    env: Rc<RefCell<Environment>>,
}

impl rustyline::completion::Completer for LispCompleter {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        // Complete on the trailing atom, against everything visible in the
        // environment plus the special form keywords.
        let candidates = match tokenize(&line[..pos]) {
            Ok(tokens) => match tokens.last() {
                Some(Token::Atom(prefix)) => self
                    .env
                    .borrow()
                    .get_identifiers()
                    .union(&special_form_identifiers())
                    .filter_map(|id| {
                        id.strip_prefix(prefix.as_str())
                            .map(|suffix| suffix.to_string())
                    })
                    .collect(),
                _ => vec![],
            },
            Err(_) => vec![],
        };
        Ok((pos, candidates))
    }
}

/// Keeps the editor reading more lines until brackets and strings balance,
/// so multi-line definitions can be typed naturally.
struct BracketValidator;

impl Validator for BracketValidator {
    fn validate(&self, ctx: &mut ValidationContext) -> rustyline::Result<ValidationResult> {
        let mut depth: i32 = 0;
        let mut in_comment = false;
        for c in ctx.input().chars() {
            match c {
                '\n' => in_comment = false,
                _ if in_comment => {}
                ';' => in_comment = true,
                '(' => depth += 1,
                ')' => {
                    if depth == 0 {
                        // the parser will report the stray bracket
                        return Ok(ValidationResult::Valid(None));
                    }
                    depth -= 1;
                }
                _ => {}
            }
        }
        if depth > 0 {
            Ok(ValidationResult::Incomplete)
        } else {
            Ok(ValidationResult::Valid(None))
        }
    }
}

#[derive(Completer, Helper, Highlighter, Hinter, Validator)]
struct ReplHelper {
    #[rustyline(Validator)]
    validator: BracketValidator,
    #[rustyline(Completer)]
    completer: LispCompleter,
}

fn main() -> rustyline::Result<()> {
    println!("minilisp REPL");
    println!("Type 'exit' or press Ctrl-D to quit.");

    let env = Environment::new_default();
    let helper = ReplHelper {
        validator: BracketValidator,
        completer: LispCompleter { env: env.clone() },
    };
    let mut rl = Editor::new()?;
    rl.set_helper(Some(helper));
    if rl.load_history(HISTORY_FILE).is_err() {
        println!("No previous history.");
    }

    loop {
        match rl.readline("minilisp> ") {
            Ok(line) => {
                rl.add_history_entry(line.as_str())?;
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }
                if input.eq_ignore_ascii_case("exit") {
                    break;
                }

                // A failure aborts this evaluation only; the session and its
                // environment carry on.
                match evaluate_source(input, env.clone()).and_then(|value| lispify(&value)) {
                    Ok(rendered) => println!("{}", rendered),
                    Err(e) => eprintln!("Error: {}", e),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("Interrupted. Type 'exit' or Ctrl-D to quit.");
            }
            Err(ReadlineError::Eof) => {
                println!("\nExiting.");
                break;
            }
            Err(err) => {
                eprintln!("Readline Error: {:?}", err);
                break;
            }
        }
    }
    rl.save_history(HISTORY_FILE)
}
