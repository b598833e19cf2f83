use serde::Serialize;
use std::fmt;

/// Line/column position of a node in the source text, both 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

// Declarations

/// The single top-level type declaration of one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompilationUnit {
    pub declaration: TypeDeclaration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeDeclaration {
    Class(ClassDeclaration),
    Interface(InterfaceDeclaration),
    Enum(EnumDeclaration),
}

impl TypeDeclaration {
    pub fn name(&self) -> &str {
        match self {
            TypeDeclaration::Class(class) => &class.name,
            TypeDeclaration::Interface(interface) => &interface.name,
            TypeDeclaration::Enum(enumeration) => &enumeration.name,
        }
    }

    pub fn modifiers(&self) -> &[Modifier] {
        match self {
            TypeDeclaration::Class(class) => &class.modifiers,
            TypeDeclaration::Interface(interface) => &interface.modifiers,
            TypeDeclaration::Enum(enumeration) => &enumeration.modifiers,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            TypeDeclaration::Class(_) => NodeKind::Class,
            TypeDeclaration::Interface(_) => NodeKind::Interface,
            TypeDeclaration::Enum(_) => NodeKind::Enum,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassDeclaration {
    pub modifiers: Vec<Modifier>,
    pub name: String,
    pub extends: Option<TypeRef>,
    pub implements: Vec<TypeRef>,
    pub body: Vec<Member>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterfaceDeclaration {
    pub modifiers: Vec<Modifier>,
    pub name: String,
    pub extends: Vec<TypeRef>,
    pub body: Vec<Member>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumDeclaration {
    pub modifiers: Vec<Modifier>,
    pub name: String,
    pub constants: Vec<String>,
}

// Members

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Member {
    Method(MethodDeclaration),
    Field(FieldDeclaration),
    Constructor(ConstructorDeclaration),
    Property(PropertyDeclaration),
    Initializer(Initializer),
    Declaration(TypeDeclaration),
    /// A stray `;` in a class body.
    Empty,
}

impl Member {
    pub fn kind(&self) -> NodeKind {
        match self {
            Member::Method(_) => NodeKind::Method,
            Member::Field(_) => NodeKind::Field,
            Member::Constructor(_) => NodeKind::Constructor,
            Member::Property(_) => NodeKind::Property,
            Member::Initializer(_) => NodeKind::Initializer,
            Member::Declaration(declaration) => declaration.kind(),
            Member::Empty => NodeKind::EmptyMember,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodDeclaration {
    pub modifiers: Vec<Modifier>,
    /// `None` means `void`.
    pub return_type: Option<TypeRef>,
    pub name: String,
    pub parameters: Vec<FormalParameter>,
    /// `None` for abstract and interface methods.
    pub body: Option<Block>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDeclaration {
    pub modifiers: Vec<Modifier>,
    pub ty: TypeRef,
    pub declarators: Vec<VariableDeclarator>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariableDeclarator {
    pub name: String,
    pub initializer: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConstructorDeclaration {
    pub modifiers: Vec<Modifier>,
    /// Dotted name segments, usually just the class name.
    pub name: Vec<String>,
    pub parameters: Vec<FormalParameter>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyDeclaration {
    pub modifiers: Vec<Modifier>,
    pub ty: TypeRef,
    pub name: String,
    pub accessors: Vec<PropertyAccessor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyAccessor {
    pub modifiers: Vec<Modifier>,
    pub kind: AccessorKind,
    /// `None` for the `get;` / `set;` form.
    pub body: Option<Block>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessorKind {
    Get,
    Set,
}

impl AccessorKind {
    pub fn keyword(self) -> &'static str {
        match self {
            AccessorKind::Get => "get",
            AccessorKind::Set => "set",
        }
    }
}

/// A bare block in a class body, optionally `static`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Initializer {
    pub is_static: bool,
    pub body: Block,
}

// Statements

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Block {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Statement {
    Block(Block),
    If(IfStatement),
    While(WhileStatement),
    For(ForStatement),
    Try(TryStatement),
    Return(Option<Expression>),
    Throw(Expression),
    Break,
    Continue,
    Dml(DmlStatement),
    LocalVariable(LocalVariableDeclaration),
    Expression(Expression),
}

impl Statement {
    pub fn kind(&self) -> NodeKind {
        match self {
            Statement::Block(_) => NodeKind::Block,
            Statement::If(_) => NodeKind::If,
            Statement::While(_) => NodeKind::While,
            Statement::For(_) => NodeKind::For,
            Statement::Try(_) => NodeKind::Try,
            Statement::Return(_) => NodeKind::Return,
            Statement::Throw(_) => NodeKind::Throw,
            Statement::Break => NodeKind::Break,
            Statement::Continue => NodeKind::Continue,
            Statement::Dml(_) => NodeKind::Dml,
            Statement::LocalVariable(_) => NodeKind::LocalVariable,
            Statement::Expression(_) => NodeKind::ExpressionStatement,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IfStatement {
    pub condition: Expression,
    pub then_branch: Box<Statement>,
    pub else_branch: Option<Box<Statement>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WhileStatement {
    pub condition: Expression,
    pub body: Box<Statement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForStatement {
    pub control: ForControl,
    pub body: Box<Statement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ForControl {
    /// `for (Type name : iterable)`
    Enhanced {
        modifiers: Vec<Modifier>,
        ty: TypeRef,
        name: String,
        iterable: Expression,
    },
    /// `for (init; condition; update)`
    Classic {
        init: Option<ForInit>,
        condition: Option<Expression>,
        update: Vec<Expression>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ForInit {
    LocalVariable(LocalVariableDeclaration),
    Expressions(Vec<Expression>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TryStatement {
    pub block: Block,
    pub catches: Vec<CatchClause>,
    pub finally: Option<Block>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatchClause {
    pub modifiers: Vec<Modifier>,
    pub ty: TypeRef,
    pub name: String,
    pub block: Block,
}

/// `insert x;`, `update x;` and friends. The keyword is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DmlStatement {
    pub operation: String,
    pub expression: Expression,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalVariableDeclaration {
    pub modifiers: Vec<Modifier>,
    pub ty: TypeRef,
    pub declarators: Vec<VariableDeclarator>,
}

// Expressions

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Expression {
    Assignment {
        target: Box<Expression>,
        operator: String,
        value: Box<Expression>,
    },
    Conditional {
        condition: Box<Expression>,
        then_value: Box<Expression>,
        else_value: Box<Expression>,
    },
    Binary {
        kind: BinaryKind,
        operator: String,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Unary {
        fixity: Fixity,
        operator: String,
        operand: Box<Expression>,
    },
    Cast {
        ty: TypeRef,
        operand: Box<Expression>,
    },
    InstanceOf {
        operand: Box<Expression>,
        ty: TypeRef,
    },
    New(Creator),
    ArrayAccess {
        array: Box<Expression>,
        index: Box<Expression>,
    },
    Chain(ChainExpression),
    /// A call without a receiver: `foo(x)`, `this(x)`, `super(x)`.
    Call {
        name: String,
        arguments: Vec<Expression>,
    },
    Paren(Box<Expression>),
    Primary(Primary),
}

impl Expression {
    pub fn kind(&self) -> NodeKind {
        match self {
            Expression::Assignment { .. } => NodeKind::Assignment,
            Expression::Conditional { .. } => NodeKind::Conditional,
            Expression::Binary { .. } => NodeKind::Binary,
            Expression::Unary { .. } => NodeKind::Unary,
            Expression::Cast { .. } => NodeKind::Cast,
            Expression::InstanceOf { .. } => NodeKind::InstanceOf,
            Expression::New(_) => NodeKind::New,
            Expression::ArrayAccess { .. } => NodeKind::ArrayAccess,
            Expression::Chain(_) => NodeKind::Chain,
            Expression::Call { .. } => NodeKind::Call,
            Expression::Paren(_) => NodeKind::Paren,
            Expression::Primary(primary) => primary.kind(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryKind {
    LogicalAnd,
    LogicalOr,
    BitAnd,
    BitOr,
    BitXor,
    Shift,
    Arithmetic,
    Comparison,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Fixity {
    Prefix,
    Postfix,
}

/// One step of a chain: `receiver.link`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainExpression {
    pub receiver: Box<Expression>,
    pub link: Link,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub navigation: Navigation,
    pub member: String,
    /// `Some` for a method-call link, `None` for member access.
    pub arguments: Option<Vec<Expression>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Navigation {
    Dot,
    SafeDot,
}

impl Navigation {
    pub fn as_str(self) -> &'static str {
        match self {
            Navigation::Dot => ".",
            Navigation::SafeDot => "?.",
        }
    }
}

/// What follows `new`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Creator {
    pub ty: TypeRef,
    pub body: CreatorBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CreatorBody {
    /// `Account(Name = 'x')`
    Arguments(Vec<Expression>),
    /// `String[5]`
    ArraySize(Box<Expression>),
    /// `List<String>{'a', 'b'}` or `String[]{'a'}`
    CollectionInit(Vec<Expression>),
    /// `Map<String, Integer>{'a' => 1}`
    MapInit(Vec<(Expression, Expression)>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Primary {
    Literal(String),
    Identifier(String),
    This,
    Super,
    /// A dotted path such as `Schema.SObjectType.Account`.
    TypeRef(TypeRef),
    /// `Account.class`
    ClassLiteral(TypeRef),
    Query(EmbeddedQuery),
}

impl Primary {
    pub fn kind(&self) -> NodeKind {
        match self {
            Primary::Literal(_) => NodeKind::Literal,
            Primary::Identifier(_) => NodeKind::Identifier,
            Primary::This => NodeKind::This,
            Primary::Super => NodeKind::Super,
            Primary::TypeRef(_) => NodeKind::TypeRef,
            Primary::ClassLiteral(_) => NodeKind::ClassLiteral,
            Primary::Query(_) => NodeKind::EmbeddedQuery,
        }
    }
}

/// Raw text of a bracketed SOQL/SOSL query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbeddedQuery {
    pub text: String,
    pub span: Option<Span>,
}

// Supporting nodes

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeRef {
    pub segments: Vec<TypeName>,
    /// Verbatim `[]` pairs following the name, e.g. `"[][]"`.
    pub array_suffix: String,
}

impl TypeRef {
    /// A reference made of plain dotted names without generics or array suffix.
    pub fn path<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: names.into_iter().map(TypeName::simple).collect(),
            array_suffix: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeName {
    pub name: String,
    pub arguments: Vec<TypeRef>,
}

impl TypeName {
    pub fn simple(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: Vec::new(),
        }
    }
}

/// A modifier keyword or annotation, kept as written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Modifier(pub String);

impl Modifier {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn text(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormalParameter {
    pub modifiers: Vec<Modifier>,
    pub ty: TypeRef,
    pub name: String,
}

/// Node kinds named in diagnostics and errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NodeKind {
    CompilationUnit,
    Class,
    Interface,
    Enum,
    Method,
    Field,
    Constructor,
    Property,
    Accessor,
    Initializer,
    EmptyMember,
    Block,
    If,
    While,
    For,
    Try,
    Return,
    Throw,
    Break,
    Continue,
    Dml,
    LocalVariable,
    ExpressionStatement,
    Assignment,
    Conditional,
    Binary,
    Unary,
    Cast,
    InstanceOf,
    New,
    ArrayAccess,
    Chain,
    Call,
    Paren,
    Literal,
    Identifier,
    This,
    Super,
    TypeRef,
    ClassLiteral,
    EmbeddedQuery,
    FormalParameter,
    VariableDeclarator,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::CompilationUnit => "compilation unit",
            NodeKind::Class => "class declaration",
            NodeKind::Interface => "interface declaration",
            NodeKind::Enum => "enum declaration",
            NodeKind::Method => "method declaration",
            NodeKind::Field => "field declaration",
            NodeKind::Constructor => "constructor declaration",
            NodeKind::Property => "property declaration",
            NodeKind::Accessor => "property accessor",
            NodeKind::Initializer => "initializer block",
            NodeKind::EmptyMember => "empty member",
            NodeKind::Block => "block",
            NodeKind::If => "if statement",
            NodeKind::While => "while statement",
            NodeKind::For => "for statement",
            NodeKind::Try => "try statement",
            NodeKind::Return => "return statement",
            NodeKind::Throw => "throw statement",
            NodeKind::Break => "break statement",
            NodeKind::Continue => "continue statement",
            NodeKind::Dml => "DML statement",
            NodeKind::LocalVariable => "local variable declaration",
            NodeKind::ExpressionStatement => "expression statement",
            NodeKind::Assignment => "assignment",
            NodeKind::Conditional => "conditional expression",
            NodeKind::Binary => "binary expression",
            NodeKind::Unary => "unary expression",
            NodeKind::Cast => "cast expression",
            NodeKind::InstanceOf => "instanceof expression",
            NodeKind::New => "new expression",
            NodeKind::ArrayAccess => "array access",
            NodeKind::Chain => "chained expression",
            NodeKind::Call => "method call",
            NodeKind::Paren => "parenthesized expression",
            NodeKind::Literal => "literal",
            NodeKind::Identifier => "identifier",
            NodeKind::This => "this",
            NodeKind::Super => "super",
            NodeKind::TypeRef => "type reference",
            NodeKind::ClassLiteral => "class literal",
            NodeKind::EmbeddedQuery => "embedded query",
            NodeKind::FormalParameter => "formal parameter",
            NodeKind::VariableDeclarator => "variable declarator",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
