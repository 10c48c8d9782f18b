/// 一行输入解析出的命令树，执行期间只读
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub kind: CommandKind,
    pub redirections: Redirections,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandKind {
    Plain(Vec<String>),
    Sequence(Box<Command>, Box<Command>),
    And(Box<Command>, Box<Command>),
    Or(Box<Command>, Box<Command>),
    Pipe(Box<Command>, Box<Command>),
    /// 子 shell，`( ... )`
    Void(Box<Command>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Redirections {
    pub input: Option<String>,
    pub output: Option<String>,
    pub append: Option<String>,
    pub error: Option<String>,
}

impl Redirections {
    pub fn is_empty(&self) -> bool {
        self.input.is_none()
            && self.output.is_none()
            && self.append.is_none()
            && self.error.is_none()
    }
}

impl Command {
    pub fn plain<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_kind(CommandKind::Plain(args.into_iter().map(Into::into).collect()))
    }

    pub fn sequence(left: Command, right: Command) -> Self {
        Self::from_kind(CommandKind::Sequence(Box::new(left), Box::new(right)))
    }

    pub fn and(left: Command, right: Command) -> Self {
        Self::from_kind(CommandKind::And(Box::new(left), Box::new(right)))
    }

    pub fn or(left: Command, right: Command) -> Self {
        Self::from_kind(CommandKind::Or(Box::new(left), Box::new(right)))
    }

    pub fn pipe(left: Command, right: Command) -> Self {
        Self::from_kind(CommandKind::Pipe(Box::new(left), Box::new(right)))
    }

    pub fn void(inner: Command) -> Self {
        Self::from_kind(CommandKind::Void(Box::new(inner)))
    }

    pub fn from_kind(kind: CommandKind) -> Self {
        Self {
            kind,
            redirections: Redirections::default(),
        }
    }

    pub fn with_redirections(mut self, redirections: Redirections) -> Self {
        self.redirections = redirections;
        self
    }
}
