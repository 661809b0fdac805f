use crate::base::GenError;
use std::collections::BTreeSet;

/// Defines the assignment operators
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AssignOp {
    Set,
    Add,
    Sub,
    Mul,
    Div,
}

impl AssignOp {
    /// Returns the C++ operator
    pub fn symbol(&self) -> &'static str {
        match self {
            AssignOp::Set => "=",
            AssignOp::Add => "+=",
            AssignOp::Sub => "-=",
            AssignOp::Mul => "*=",
            AssignOp::Div => "/=",
        }
    }
}

/// Holds a statement of generated code
///
/// Expressions are kept as text; declarations and control flow are structured
/// so that the writer can track scopes and detect name collisions.
#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
    /// Declares a local variable (`auto` if the type is empty)
    Declare {
        type_name: String,
        name: String,
        init: Option<String>,
    },

    /// Assigns a value to a target
    Assign { target: String, op: AssignOp, value: String },

    /// Verbatim code (possibly several lines)
    Raw(String),

    /// Single line comment
    Comment(String),

    /// Conditional
    If {
        condition: String,
        then: Vec<Stmt>,
        otherwise: Vec<Stmt>,
    },

    /// Loop with a condition
    While { condition: String, body: Vec<Stmt> },

    /// Counted loop over `0..end` using an index variable
    For { index: String, end: String, body: Vec<Stmt> },

    /// Return statement
    Return(Option<String>),

    /// Nested scope
    Block(Vec<Stmt>),
}

impl Stmt {
    /// Returns a declaration
    pub fn declare(type_name: &str, name: &str, init: &str) -> Self {
        Stmt::Declare {
            type_name: type_name.to_string(),
            name: name.to_string(),
            init: if init.is_empty() { None } else { Some(init.to_string()) },
        }
    }

    /// Returns `target = value`
    pub fn set(target: &str, value: &str) -> Self {
        Stmt::Assign {
            target: target.to_string(),
            op: AssignOp::Set,
            value: value.to_string(),
        }
    }

    /// Returns `target op value`
    pub fn assign(target: &str, op: AssignOp, value: &str) -> Self {
        Stmt::Assign {
            target: target.to_string(),
            op,
            value: value.to_string(),
        }
    }

    /// Returns verbatim code
    pub fn raw(code: &str) -> Self {
        Stmt::Raw(code.to_string())
    }

    /// Returns a comment
    pub fn comment(text: &str) -> Self {
        Stmt::Comment(text.to_string())
    }

    /// Returns a conditional without else branch
    pub fn if_then(condition: &str, then: Vec<Stmt>) -> Self {
        Stmt::If {
            condition: condition.to_string(),
            then,
            otherwise: Vec::new(),
        }
    }

    /// Returns a conditional with an else branch
    pub fn if_else(condition: &str, then: Vec<Stmt>, otherwise: Vec<Stmt>) -> Self {
        Stmt::If {
            condition: condition.to_string(),
            then,
            otherwise,
        }
    }

    /// Returns a while loop
    pub fn while_loop(condition: &str, body: Vec<Stmt>) -> Self {
        Stmt::While {
            condition: condition.to_string(),
            body,
        }
    }

    /// Returns a counted loop
    pub fn for_loop(index: &str, end: &str, body: Vec<Stmt>) -> Self {
        Stmt::For {
            index: index.to_string(),
            end: end.to_string(),
            body,
        }
    }

    /// Returns a return statement
    pub fn ret(value: &str) -> Self {
        if value.is_empty() {
            Stmt::Return(None)
        } else {
            Stmt::Return(Some(value.to_string()))
        }
    }
}

/// Writes generated code with indentation and scope tracking
///
/// The outermost scope is seeded with the names of the members of the
/// behaviour; declaring a local variable that shadows a member or another
/// visible local variable is a generation error.
#[derive(Clone, Debug)]
pub struct SourceWriter {
    /// Generated text
    buffer: String,

    /// Current indentation level
    indent: usize,

    /// Names declared in each open scope
    scopes: Vec<BTreeSet<String>>,
}

impl SourceWriter {
    /// Allocates a new instance with the given member names
    pub fn new<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SourceWriter {
            buffer: String::new(),
            indent: 0,
            scopes: vec![members.into_iter().map(|s| s.into()).collect()],
        }
    }

    /// Returns true if the name is visible
    pub fn is_declared(&self, name: &str) -> bool {
        self.scopes.iter().any(|s| s.contains(name))
    }

    /// Registers a name in the current scope
    pub fn register(&mut self, name: &str) -> Result<(), GenError> {
        if self.is_declared(name) {
            return Err(GenError::NameAlreadyRegistered(name.to_string()));
        }
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string());
        }
        Ok(())
    }

    /// Writes one line at the current indentation
    ///
    /// A text spanning several lines has each of them indented.
    pub fn line(&mut self, text: &str) {
        if text.is_empty() {
            self.buffer.push('\n');
            return;
        }
        for l in text.split('\n') {
            for _ in 0..self.indent {
                self.buffer.push_str("  ");
            }
            self.buffer.push_str(l);
            self.buffer.push('\n');
        }
    }

    /// Writes an empty line
    pub fn blank(&mut self) {
        self.buffer.push('\n');
    }

    /// Writes several lines, re-indenting each of them
    pub fn lines(&mut self, code: &str) {
        for l in code.lines() {
            let trimmed = l.trim();
            if !trimmed.is_empty() {
                self.line(trimmed);
            }
        }
    }

    /// Appends text generated by another writer, as is
    pub fn append(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    /// Writes `header{` and opens a scope
    pub fn open(&mut self, header: &str) {
        self.line(&format!("{}{{", header));
        self.indent += 1;
        self.scopes.push(BTreeSet::new());
    }

    /// Closes a scope and writes `}` followed by the suffix
    pub fn close(&mut self, suffix: &str) {
        self.indent = self.indent.saturating_sub(1);
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
        self.line(&format!("}}{}", suffix));
    }

    /// Closes a scope and reopens another one (e.g. `} else {`)
    pub fn reopen(&mut self, header: &str) {
        self.close(header);
        let last = self.buffer.pop();
        debug_assert_eq!(last, Some('\n'));
        self.buffer.push_str("{\n");
        self.indent += 1;
        self.scopes.push(BTreeSet::new());
    }

    /// Declares a local variable
    pub fn declare(&mut self, type_name: &str, name: &str, init: &str) -> Result<(), GenError> {
        self.emit(&Stmt::declare(type_name, name, init))
    }

    /// Writes a statement
    pub fn emit(&mut self, stmt: &Stmt) -> Result<(), GenError> {
        match stmt {
            Stmt::Declare { type_name, name, init } => {
                self.register(name)?;
                let t = if type_name.is_empty() { "auto" } else { type_name.as_str() };
                match init {
                    Some(value) => self.line(&format!("{} {} = {};", t, name, value)),
                    None => self.line(&format!("{} {};", t, name)),
                }
            }
            Stmt::Assign { target, op, value } => self.line(&format!("{} {} {};", target, op.symbol(), value)),
            Stmt::Raw(code) => self.lines(code),
            Stmt::Comment(text) => self.line(&format!("// {}", text)),
            Stmt::If {
                condition,
                then,
                otherwise,
            } => {
                self.open(&format!("if({})", condition));
                self.emit_all(then)?;
                if otherwise.is_empty() {
                    self.close("");
                } else {
                    self.reopen(" else ");
                    self.emit_all(otherwise)?;
                    self.close("");
                }
            }
            Stmt::While { condition, body } => {
                self.open(&format!("while({})", condition));
                self.emit_all(body)?;
                self.close("");
            }
            Stmt::For { index, end, body } => {
                self.open(&format!(
                    "for(unsigned short {} = 0; {} != {}; ++{})",
                    index, index, end, index
                ));
                self.register(index)?;
                self.emit_all(body)?;
                self.close("");
            }
            Stmt::Return(value) => match value {
                Some(v) => self.line(&format!("return {};", v)),
                None => self.line("return;"),
            },
            Stmt::Block(body) => {
                self.open("");
                self.emit_all(body)?;
                self.close("");
            }
        }
        Ok(())
    }

    /// Writes a list of statements
    pub fn emit_all(&mut self, stmts: &[Stmt]) -> Result<(), GenError> {
        for stmt in stmts {
            self.emit(stmt)?;
        }
        Ok(())
    }

    /// Returns the generated text
    pub fn finish(self) -> String {
        self.buffer
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{AssignOp, SourceWriter, Stmt};
    use crate::base::GenError;

    #[test]
    fn emit_works() {
        let mut w = SourceWriter::new(["dp", "seq"]);
        w.open("bool NewtonIntegration()");
        w.declare("strain", "newton_f", "").unwrap();
        w.emit(&Stmt::while_loop(
            "!converged",
            vec![
                Stmt::set("newton_f", "this->dp"),
                Stmt::if_else(
                    "newton_f > 0",
                    vec![Stmt::assign("this->dp", AssignOp::Sub, "newton_f")],
                    vec![Stmt::comment("inactive"), Stmt::ret("false")],
                ),
            ],
        ))
        .unwrap();
        w.emit(&Stmt::ret("true")).unwrap();
        w.close("");
        assert_eq!(
            w.finish(),
            "bool NewtonIntegration(){\n\
             \x20 strain newton_f;\n\
             \x20 while(!converged){\n\
             \x20   newton_f = this->dp;\n\
             \x20   if(newton_f > 0){\n\
             \x20     this->dp -= newton_f;\n\
             \x20   } else {\n\
             \x20     // inactive\n\
             \x20     return false;\n\
             \x20   }\n\
             \x20 }\n\
             \x20 return true;\n\
             }\n"
        );
    }

    #[test]
    fn declare_captures_collisions() {
        let mut w = SourceWriter::new(["seq"]);
        w.open("void f()");
        assert_eq!(
            w.declare("stress", "seq", "0").err(),
            Some(GenError::NameAlreadyRegistered("seq".to_string()))
        );
        w.declare("", "x", "1").unwrap();
        w.emit(&Stmt::Block(vec![Stmt::declare("real", "y", "2")])).unwrap();
        // y went out of scope
        w.declare("real", "y", "3").unwrap();
        assert_eq!(
            w.emit(&Stmt::for_loop("x", "3", vec![])).err(),
            Some(GenError::NameAlreadyRegistered("x".to_string()))
        );
        w.close("");
        w.close("");
        assert!(!w.is_declared("x"));
        assert!(w.is_declared("seq"));
    }

    #[test]
    fn lines_works() {
        let mut w = SourceWriter::new(Vec::<String>::new());
        w.open("struct A");
        w.lines("  real a;\n\n     real b;\n");
        w.close(";");
        assert_eq!(w.finish(), "struct A{\n  real a;\n  real b;\n};\n");
    }

    #[test]
    fn multi_line_headers_are_indented() {
        let mut w = SourceWriter::new(Vec::<String>::new());
        w.open("struct A");
        w.open("IntegrationResult\nintegrate(const SMFlag smflag, const SMType smt) override");
        w.line("return SUCCESS;");
        w.close("");
        w.close(";");
        assert_eq!(
            w.finish(),
            "struct A{\n  IntegrationResult\n  integrate(const SMFlag smflag, const SMType smt) override{\n    return SUCCESS;\n  }\n};\n"
        );
    }
}
