//! Command parsing and routing.
//!
//! Parses one line of input into a [`Command`]. Parsing never fails: input
//! that matches nothing becomes [`Command::Unknown`].

use regex::{Regex, RegexBuilder};

use super::definitions::{Route, COMMANDS};
use crate::error::{Result, TrainerError};

/// Query-building verbs that mark a bare line as an object-query expression.
const EXPRESSION_VERBS: &str =
    "find|where|select|joins|includes|group|order|limit|count|sum|average|pluck|first|last|all";

/// Parsed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Blank input.
    Empty,
    Help,
    Exit,
    Clear,
    Tasks,
    Task(String),
    Configs,
    Connect(String),
    Connection,
    Disconnect,
    Tables,
    Describe(String),
    Relations(Option<String>),
    Sql(String),
    Expression(String),
    Explain(String),
    Unknown(String),
}

/// Ordered matcher table built once from [`COMMANDS`].
#[derive(Debug)]
pub struct CommandRouter {
    routes: Vec<(Regex, Route)>,
    expression_heuristics: Vec<Regex>,
}

impl CommandRouter {
    pub fn new() -> Result<Self> {
        let routes = COMMANDS
            .iter()
            .map(|def| {
                RegexBuilder::new(def.pattern)
                    .case_insensitive(true)
                    .build()
                    .map(|re| (re, def.route))
                    .map_err(|e| {
                        TrainerError::internal(format!("Invalid pattern for '{}': {e}", def.usage))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        // Case-sensitive: `Course.where` routes, `Course.WHERE` does not.
        let expression_heuristics = [
            format!(r"^\w+\.(?:{EXPRESSION_VERBS})"),
            r"^\w+::".to_string(),
        ]
        .iter()
        .map(|p| {
            Regex::new(p)
                .map_err(|e| TrainerError::internal(format!("Invalid expression heuristic: {e}")))
        })
        .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            routes,
            expression_heuristics,
        })
    }

    /// Parses one line of input.
    pub fn parse(&self, input: &str) -> Command {
        let input = input.trim();
        if input.is_empty() {
            return Command::Empty;
        }

        for (pattern, route) in &self.routes {
            if let Some(caps) = pattern.captures(input) {
                let arg = caps.get(1).map(|m| m.as_str().trim().to_string());
                return Self::build(*route, arg);
            }
        }

        if self.looks_like_expression(input) {
            return Command::Expression(input.to_string());
        }

        Command::Unknown(input.to_string())
    }

    fn looks_like_expression(&self, input: &str) -> bool {
        self.expression_heuristics.iter().any(|re| re.is_match(input))
    }

    fn build(route: Route, arg: Option<String>) -> Command {
        let arg_or_empty = || arg.clone().unwrap_or_default();
        match route {
            Route::Help => Command::Help,
            Route::Exit => Command::Exit,
            Route::Clear => Command::Clear,
            Route::Tasks => Command::Tasks,
            Route::Task => Command::Task(arg_or_empty()),
            Route::Configs => Command::Configs,
            Route::Connect => Command::Connect(arg_or_empty()),
            Route::Connection => Command::Connection,
            Route::Disconnect => Command::Disconnect,
            Route::Tables => Command::Tables,
            Route::Describe => Command::Describe(arg_or_empty()),
            Route::Relations => Command::Relations(arg.clone()),
            Route::Sql => Command::Sql(arg_or_empty()),
            Route::Expression => Command::Expression(arg_or_empty()),
            Route::Explain => Command::Explain(arg_or_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router() -> CommandRouter {
        CommandRouter::new().unwrap()
    }

    #[test]
    fn test_blank_input() {
        assert_eq!(router().parse(""), Command::Empty);
        assert_eq!(router().parse("   \t"), Command::Empty);
    }

    #[test]
    fn test_general_commands() {
        let r = router();
        for input in ["help", "h", "?", "HELP"] {
            assert_eq!(r.parse(input), Command::Help, "{input}");
        }
        for input in ["exit", "quit", "q", "Quit"] {
            assert_eq!(r.parse(input), Command::Exit, "{input}");
        }
        assert_eq!(r.parse("cls"), Command::Clear);
        assert_eq!(r.parse("  clear  "), Command::Clear);
    }

    #[test]
    fn test_connection_commands() {
        let r = router();
        assert_eq!(r.parse("configs"), Command::Configs);
        assert_eq!(
            r.parse("connect learn_hub_sqlite3"),
            Command::Connect("learn_hub_sqlite3".into())
        );
        assert_eq!(r.parse("CONNECT shop_mysql2"), Command::Connect("shop_mysql2".into()));
        assert_eq!(r.parse("connection"), Command::Connection);
        assert_eq!(r.parse("disconnect"), Command::Disconnect);
        // `connect` without a name is not a connect.
        assert_eq!(r.parse("connect"), Command::Unknown("connect".into()));
    }

    #[test]
    fn test_schema_commands() {
        let r = router();
        assert_eq!(r.parse("tables"), Command::Tables);
        assert_eq!(r.parse("describe courses"), Command::Describe("courses".into()));
        assert_eq!(r.parse("desc users"), Command::Describe("users".into()));
        assert_eq!(r.parse("relations"), Command::Relations(None));
        assert_eq!(r.parse("rels courses"), Command::Relations(Some("courses".into())));
    }

    #[test]
    fn test_query_commands() {
        let r = router();
        assert_eq!(
            r.parse("sql SELECT 1"),
            Command::Sql("SELECT 1".into())
        );
        assert_eq!(
            r.parse("SELECT * FROM users"),
            Command::Sql("SELECT * FROM users".into())
        );
        assert_eq!(
            r.parse("select count(*) from courses"),
            Command::Sql("select count(*) from courses".into())
        );
        assert_eq!(
            r.parse("ar Course.count"),
            Command::Expression("Course.count".into())
        );
        assert_eq!(
            r.parse("explain SELECT * FROM users"),
            Command::Explain("SELECT * FROM users".into())
        );
    }

    #[test]
    fn test_task_commands() {
        let r = router();
        assert_eq!(r.parse("tasks"), Command::Tasks);
        assert_eq!(r.parse("rake tasks"), Command::Tasks);
        assert_eq!(r.parse("task db:seed"), Command::Task("db:seed".into()));
        assert_eq!(r.parse("rake db:migrate"), Command::Task("db:migrate".into()));
    }

    #[test]
    fn test_expression_heuristic() {
        let r = router();
        assert_eq!(
            r.parse("Course.where(level: \"beginner\")"),
            Command::Expression("Course.where(level: \"beginner\")".into())
        );
        assert_eq!(
            r.parse("LearnHub::Course.first"),
            Command::Expression("LearnHub::Course.first".into())
        );
        assert_eq!(r.parse("User.all"), Command::Expression("User.all".into()));
        // Unlisted verbs and lowercase verbs fall through.
        assert_eq!(
            r.parse("Course.table_name"),
            Command::Unknown("Course.table_name".into())
        );
        assert_eq!(
            r.parse("Course.WHERE(id: 1)"),
            Command::Unknown("Course.WHERE(id: 1)".into())
        );
    }

    #[test]
    fn test_first_match_wins() {
        let r = router();
        assert_eq!(r.parse("sql select 1"), Command::Sql("select 1".into()));
        // The `ar` prefix wins over the bare SQL pattern.
        assert_eq!(
            r.parse("ar select 1"),
            Command::Expression("select 1".into())
        );
        // Verb prefixes route, so `find_by` is an expression too.
        assert_eq!(
            r.parse("Course.find_by(id: 1)"),
            Command::Expression("Course.find_by(id: 1)".into())
        );
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(router().parse("frobnicate"), Command::Unknown("frobnicate".into()));
    }
}
