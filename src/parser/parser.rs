use crate::error::ParseError;
use crate::parser::lexer::{tokenize, Token, TokenKind};
use crate::parser::types::*;
use tracing::trace;

/// Words that can never be used as identifiers.
const RESERVED: &[&str] = &[
    "break", "catch", "class", "continue", "do", "else", "enum", "extends", "false", "finally",
    "for", "if", "implements", "instanceof", "interface", "new", "null", "return", "super", "this",
    "throw", "true", "try", "void", "while",
];

const MODIFIER_KEYWORDS: &[&str] = &[
    "public",
    "private",
    "protected",
    "global",
    "static",
    "final",
    "abstract",
    "virtual",
    "override",
    "transient",
    "testmethod",
    "webservice",
];

const SHARING_PREFIXES: &[&str] = &["with", "without", "inherited"];

const DML_OPERATIONS: &[&str] = &["insert", "update", "upsert", "delete", "undelete", "merge"];

const ASSIGNMENT_OPERATORS: &[&str] = &["=", "+=", "-=", "*=", "/=", "&=", "|=", "^=", "<<="];

fn is_reserved(word: &str) -> bool {
    RESERVED.iter().any(|kw| kw.eq_ignore_ascii_case(word))
}

fn binary_operator(text: &str) -> Option<(u8, BinaryKind)> {
    let op = match text {
        "||" => (1, BinaryKind::LogicalOr),
        "&&" => (2, BinaryKind::LogicalAnd),
        "|" => (3, BinaryKind::BitOr),
        "^" => (4, BinaryKind::BitXor),
        "&" => (5, BinaryKind::BitAnd),
        "==" | "!=" | "===" | "!==" => (6, BinaryKind::Comparison),
        "<" | ">" | "<=" | ">=" => (7, BinaryKind::Comparison),
        "<<" | ">>" | ">>>" => (8, BinaryKind::Shift),
        "+" | "-" => (9, BinaryKind::Arithmetic),
        "*" | "/" | "%" => (10, BinaryKind::Arithmetic),
        _ => return None,
    };
    Some(op)
}

const INSTANCEOF_PRECEDENCE: u8 = 7;

/// Recursive-descent parser producing the node model from Apex source.
pub struct SourceParser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> SourceParser<'a> {
    pub fn new(source: &'a str) -> Result<Self, ParseError> {
        let tokens = tokenize(source)?;
        trace!(tokens = tokens.len(), "tokenized source");
        Ok(Self {
            source,
            tokens,
            pos: 0,
        })
    }

    pub fn parse_compilation_unit(&mut self) -> Result<CompilationUnit, ParseError> {
        let modifiers = self.parse_modifiers()?;
        let declaration = self.parse_type_declaration(modifiers)?;
        self.expect_eof()?;
        Ok(CompilationUnit { declaration })
    }

    pub fn parse_standalone_expression(&mut self) -> Result<Expression, ParseError> {
        let expression = self.parse_expression()?;
        self.expect_eof()?;
        Ok(expression)
    }

    pub fn parse_standalone_statement(&mut self) -> Result<Statement, ParseError> {
        let statement = self.parse_statement()?;
        self.expect_eof()?;
        Ok(statement)
    }

    // Token helpers

    fn peek(&self) -> &Token {
        self.nth(0)
    }

    fn nth(&self, n: usize) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.pos + n).min(last)]
    }

    fn bump(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn at(&self, punct: &str) -> bool {
        self.peek().is_punct(punct)
    }

    fn at_keyword(&self, keyword: &str) -> bool {
        self.peek().is_keyword(keyword)
    }

    fn eat(&mut self, punct: &str) -> bool {
        if self.at(punct) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.at_keyword(keyword) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        let token = self.peek();
        let found = match token.kind {
            TokenKind::Eof => "end of input".to_string(),
            _ => format!("`{}`", token.text),
        };
        ParseError::new(format!("{}, found {}", message.into(), found), token.span)
    }

    fn expect(&mut self, punct: &str) -> Result<Token, ParseError> {
        if self.at(punct) {
            Ok(self.bump())
        } else {
            Err(self.error(format!("expected `{}`", punct)))
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<Token, ParseError> {
        if self.at_keyword(keyword) {
            Ok(self.bump())
        } else {
            Err(self.error(format!("expected `{}`", keyword)))
        }
    }

    fn expect_eof(&self) -> Result<(), ParseError> {
        if self.peek().kind == TokenKind::Eof {
            Ok(())
        } else {
            Err(self.error("expected end of input"))
        }
    }

    fn is_identifier(token: &Token) -> bool {
        token.kind == TokenKind::Ident && !is_reserved(&token.text)
    }

    fn expect_identifier(&mut self) -> Result<String, ParseError> {
        if Self::is_identifier(self.peek()) {
            Ok(self.bump().text)
        } else {
            Err(self.error("expected identifier"))
        }
    }

    /// Two tokens that touch in the source, with no whitespace in between.
    fn adjacent(&self, first: usize, second: usize) -> bool {
        let (a, b) = (self.nth(first), self.nth(second));
        a.end == b.start
    }

    /// Glues runs of `>` (and a trailing `=`) back into one operator.
    ///
    /// Returns the operator text and how many tokens it spans.
    fn greater_operator(&self) -> Option<(String, usize)> {
        if !self.at(">") {
            return None;
        }
        let mut count = 1;
        while count < 3 && self.nth(count).is_punct(">") && self.adjacent(count - 1, count) {
            count += 1;
        }
        let mut text = ">".repeat(count);
        if self.nth(count).is_punct("=") && self.adjacent(count - 1, count) {
            text.push('=');
            count += 1;
        }
        Some((text, count))
    }

    /// Runs `f` and rewinds to the starting token if it fails.
    fn speculate<T>(&mut self, f: impl FnOnce(&mut Self) -> Option<T>) -> Option<T> {
        let start = self.pos;
        let result = f(self);
        if result.is_none() {
            self.pos = start;
        }
        result
    }

    // Declarations

    fn parse_modifiers(&mut self) -> Result<Vec<Modifier>, ParseError> {
        let mut modifiers = Vec::new();
        loop {
            let token = self.peek();
            if token.is_punct("@") {
                modifiers.push(self.parse_annotation()?);
            } else if MODIFIER_KEYWORDS.iter().any(|kw| token.is_keyword(kw)) {
                modifiers.push(Modifier::new(self.bump().text));
            } else if SHARING_PREFIXES.iter().any(|kw| token.is_keyword(kw))
                && self.nth(1).is_keyword("sharing")
            {
                let prefix = self.bump().text;
                let sharing = self.bump().text;
                modifiers.push(Modifier::new(format!("{} {}", prefix, sharing)));
            } else {
                return Ok(modifiers);
            }
        }
    }

    fn parse_annotation(&mut self) -> Result<Modifier, ParseError> {
        self.expect("@")?;
        let mut text = format!("@{}", self.expect_identifier()?);
        while self.at(".") && Self::is_identifier(self.nth(1)) {
            self.bump();
            text.push('.');
            text.push_str(&self.bump().text);
        }
        if self.at("(") {
            let mut depth = 0usize;
            let mut previous: Option<Token> = None;
            loop {
                let token = self.bump();
                match token.kind {
                    TokenKind::Eof => return Err(self.error("unterminated annotation arguments")),
                    TokenKind::Punct if token.text == "(" => depth += 1,
                    TokenKind::Punct if token.text == ")" => depth -= 1,
                    _ => {}
                }
                let word_like = |t: &Token| t.kind != TokenKind::Punct;
                if previous.as_ref().is_some_and(|p| word_like(p) && word_like(&token)) {
                    text.push(' ');
                }
                text.push_str(&token.text);
                previous = Some(token);
                if depth == 0 {
                    break;
                }
            }
        }
        Ok(Modifier::new(text))
    }

    fn parse_type_declaration(
        &mut self,
        modifiers: Vec<Modifier>,
    ) -> Result<TypeDeclaration, ParseError> {
        if self.at_keyword("class") {
            self.parse_class(modifiers).map(TypeDeclaration::Class)
        } else if self.at_keyword("interface") {
            self.parse_interface(modifiers).map(TypeDeclaration::Interface)
        } else if self.at_keyword("enum") {
            self.parse_enum(modifiers).map(TypeDeclaration::Enum)
        } else {
            Err(self.error("expected `class`, `interface` or `enum`"))
        }
    }

    fn parse_class(&mut self, modifiers: Vec<Modifier>) -> Result<ClassDeclaration, ParseError> {
        self.expect_keyword("class")?;
        let name = self.expect_identifier()?;
        trace!(%name, "parsing class");

        let extends = if self.eat_keyword("extends") {
            Some(self.parse_type_ref()?)
        } else {
            None
        };
        let implements = if self.eat_keyword("implements") {
            self.parse_type_list()?
        } else {
            Vec::new()
        };

        self.expect("{")?;
        let mut body = Vec::new();
        while !self.at("}") {
            body.push(self.parse_class_member()?);
        }
        self.expect("}")?;

        Ok(ClassDeclaration {
            modifiers,
            name,
            extends,
            implements,
            body,
        })
    }

    fn parse_interface(
        &mut self,
        modifiers: Vec<Modifier>,
    ) -> Result<InterfaceDeclaration, ParseError> {
        self.expect_keyword("interface")?;
        let name = self.expect_identifier()?;
        trace!(%name, "parsing interface");

        let extends = if self.eat_keyword("extends") {
            self.parse_type_list()?
        } else {
            Vec::new()
        };

        self.expect("{")?;
        let mut body = Vec::new();
        while !self.at("}") {
            if self.eat(";") {
                body.push(Member::Empty);
                continue;
            }
            let modifiers = self.parse_modifiers()?;
            let return_type = self.parse_return_type()?;
            let name = self.expect_identifier()?;
            let parameters = self.parse_formal_parameters()?;
            self.expect(";")?;
            body.push(Member::Method(MethodDeclaration {
                modifiers,
                return_type,
                name,
                parameters,
                body: None,
            }));
        }
        self.expect("}")?;

        Ok(InterfaceDeclaration {
            modifiers,
            name,
            extends,
            body,
        })
    }

    fn parse_enum(&mut self, modifiers: Vec<Modifier>) -> Result<EnumDeclaration, ParseError> {
        self.expect_keyword("enum")?;
        let name = self.expect_identifier()?;
        self.expect("{")?;
        let mut constants = Vec::new();
        while !self.at("}") {
            constants.push(self.expect_identifier()?);
            if !self.eat(",") {
                break;
            }
        }
        self.expect("}")?;
        Ok(EnumDeclaration {
            modifiers,
            name,
            constants,
        })
    }

    fn parse_class_member(&mut self) -> Result<Member, ParseError> {
        if self.eat(";") {
            return Ok(Member::Empty);
        }
        if self.at_keyword("static") && self.nth(1).is_punct("{") {
            self.bump();
            let body = self.parse_block()?;
            return Ok(Member::Initializer(Initializer {
                is_static: true,
                body,
            }));
        }
        if self.at("{") {
            let body = self.parse_block()?;
            return Ok(Member::Initializer(Initializer {
                is_static: false,
                body,
            }));
        }

        let modifiers = self.parse_modifiers()?;

        if ["class", "interface", "enum"]
            .iter()
            .any(|kw| self.at_keyword(kw))
        {
            return self
                .parse_type_declaration(modifiers)
                .map(Member::Declaration);
        }

        if self.at_constructor() {
            let mut name = vec![self.expect_identifier()?];
            while self.eat(".") {
                name.push(self.expect_identifier()?);
            }
            let parameters = self.parse_formal_parameters()?;
            let body = self.parse_block()?;
            return Ok(Member::Constructor(ConstructorDeclaration {
                modifiers,
                name,
                parameters,
                body,
            }));
        }

        let return_type = self.parse_return_type()?;
        let name = self.expect_identifier()?;

        if self.at("(") {
            let parameters = self.parse_formal_parameters()?;
            let body = if self.eat(";") {
                None
            } else {
                Some(self.parse_block()?)
            };
            return Ok(Member::Method(MethodDeclaration {
                modifiers,
                return_type,
                name,
                parameters,
                body,
            }));
        }

        let Some(ty) = return_type else {
            return Err(self.error("expected `(` after void member name"));
        };

        if self.at("{") {
            let accessors = self.parse_property_accessors()?;
            return Ok(Member::Property(PropertyDeclaration {
                modifiers,
                ty,
                name,
                accessors,
            }));
        }

        let declarators = self.parse_variable_declarators(name)?;
        self.expect(";")?;
        Ok(Member::Field(FieldDeclaration {
            modifiers,
            ty,
            declarators,
        }))
    }

    /// `Name(` or `Outer.Name(` right after the modifiers.
    fn at_constructor(&self) -> bool {
        if !Self::is_identifier(self.peek()) {
            return false;
        }
        let mut n = 0;
        while self.nth(n + 1).is_punct(".") && Self::is_identifier(self.nth(n + 2)) {
            n += 2;
        }
        self.nth(n + 1).is_punct("(")
    }

    fn parse_return_type(&mut self) -> Result<Option<TypeRef>, ParseError> {
        if self.eat_keyword("void") {
            Ok(None)
        } else {
            self.parse_type_ref().map(Some)
        }
    }

    fn parse_property_accessors(&mut self) -> Result<Vec<PropertyAccessor>, ParseError> {
        self.expect("{")?;
        let mut accessors = Vec::new();
        while !self.at("}") {
            let modifiers = self.parse_modifiers()?;
            let kind = if self.eat_keyword("get") {
                AccessorKind::Get
            } else if self.eat_keyword("set") {
                AccessorKind::Set
            } else {
                return Err(self.error("expected `get` or `set`"));
            };
            let body = if self.eat(";") {
                None
            } else {
                Some(self.parse_block()?)
            };
            accessors.push(PropertyAccessor {
                modifiers,
                kind,
                body,
            });
        }
        self.expect("}")?;
        Ok(accessors)
    }

    fn parse_formal_parameters(&mut self) -> Result<Vec<FormalParameter>, ParseError> {
        self.expect("(")?;
        let mut parameters = Vec::new();
        if self.eat(")") {
            return Ok(parameters);
        }
        loop {
            let modifiers = self.parse_modifiers()?;
            let ty = self.parse_type_ref()?;
            let name = self.expect_identifier()?;
            parameters.push(FormalParameter {
                modifiers,
                ty,
                name,
            });
            if !self.eat(",") {
                break;
            }
        }
        self.expect(")")?;
        Ok(parameters)
    }

    fn parse_variable_declarators(
        &mut self,
        first: String,
    ) -> Result<Vec<VariableDeclarator>, ParseError> {
        let mut declarators = Vec::new();
        let mut name = first;
        loop {
            let initializer = if self.eat("=") {
                Some(self.parse_expression()?)
            } else {
                None
            };
            declarators.push(VariableDeclarator { name, initializer });
            if !self.eat(",") {
                return Ok(declarators);
            }
            name = self.expect_identifier()?;
        }
    }

    fn parse_type_list(&mut self) -> Result<Vec<TypeRef>, ParseError> {
        let mut types = vec![self.parse_type_ref()?];
        while self.eat(",") {
            types.push(self.parse_type_ref()?);
        }
        Ok(types)
    }

    fn parse_type_ref(&mut self) -> Result<TypeRef, ParseError> {
        let mut segments = Vec::new();
        loop {
            let name = self.expect_identifier()?;
            let mut arguments = Vec::new();
            if self.eat("<") {
                arguments = self.parse_type_list()?;
                self.expect(">")?;
            }
            segments.push(TypeName { name, arguments });
            if self.at(".") && Self::is_identifier(self.nth(1)) {
                self.bump();
            } else {
                break;
            }
        }
        let mut array_suffix = String::new();
        while self.at("[") && self.nth(1).is_punct("]") {
            self.bump();
            self.bump();
            array_suffix.push_str("[]");
        }
        Ok(TypeRef {
            segments,
            array_suffix,
        })
    }

    // Statements

    fn parse_block(&mut self) -> Result<Block, ParseError> {
        self.expect("{")?;
        let mut statements = Vec::new();
        while !self.at("}") {
            if self.peek().kind == TokenKind::Eof {
                return Err(self.error("expected `}`"));
            }
            statements.push(self.parse_statement()?);
        }
        self.expect("}")?;
        Ok(Block { statements })
    }

    fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        if self.at("{") {
            return self.parse_block().map(Statement::Block);
        }
        if self.eat_keyword("if") {
            let condition = self.parse_par_expression()?;
            let then_branch = Box::new(self.parse_statement()?);
            let else_branch = if self.eat_keyword("else") {
                Some(Box::new(self.parse_statement()?))
            } else {
                None
            };
            return Ok(Statement::If(IfStatement {
                condition,
                then_branch,
                else_branch,
            }));
        }
        if self.eat_keyword("while") {
            let condition = self.parse_par_expression()?;
            let body = Box::new(self.parse_statement()?);
            return Ok(Statement::While(WhileStatement { condition, body }));
        }
        if self.eat_keyword("for") {
            return self.parse_for();
        }
        if self.eat_keyword("try") {
            return self.parse_try();
        }
        if self.eat_keyword("return") {
            let value = if self.at(";") {
                None
            } else {
                Some(self.parse_expression()?)
            };
            self.expect(";")?;
            return Ok(Statement::Return(value));
        }
        if self.eat_keyword("throw") {
            let value = self.parse_expression()?;
            self.expect(";")?;
            return Ok(Statement::Throw(value));
        }
        if self.eat_keyword("break") {
            self.expect(";")?;
            return Ok(Statement::Break);
        }
        if self.eat_keyword("continue") {
            self.expect(";")?;
            return Ok(Statement::Continue);
        }
        if DML_OPERATIONS.iter().any(|op| self.at_keyword(op)) && self.at_dml_operand() {
            let operation = self.bump().text;
            let expression = self.parse_expression()?;
            self.expect(";")?;
            return Ok(Statement::Dml(DmlStatement {
                operation,
                expression,
            }));
        }
        if let Some(declaration) = self.try_local_variable()? {
            self.expect(";")?;
            return Ok(Statement::LocalVariable(declaration));
        }

        let expression = self.parse_expression()?;
        self.expect(";")?;
        Ok(Statement::Expression(expression))
    }

    /// After a DML keyword: `insert acc`, `delete [SELECT ...]`, `update (acc)`.
    /// `update = x`, `update.x` and `update()` stay ordinary expressions.
    fn at_dml_operand(&self) -> bool {
        let next = self.nth(1);
        match next.kind {
            TokenKind::Ident => true,
            TokenKind::Punct if next.text == "[" => true,
            TokenKind::Punct if next.text == "(" => !self.nth(2).is_punct(")"),
            _ => false,
        }
    }

    /// `Type name [= value], ...` without the trailing semicolon, if the next
    /// tokens look like one.
    fn try_local_variable(&mut self) -> Result<Option<LocalVariableDeclaration>, ParseError> {
        let head = self.speculate(|p| {
            let modifiers = p.parse_modifiers().ok()?;
            let ty = p.parse_type_ref().ok()?;
            let follows = p.nth(1);
            let looks_like_declaration = Self::is_identifier(p.peek())
                && (follows.is_punct("=") || follows.is_punct(";") || follows.is_punct(","));
            looks_like_declaration.then_some((modifiers, ty))
        });
        let Some((modifiers, ty)) = head else {
            return Ok(None);
        };
        let name = self.expect_identifier()?;
        let declarators = self.parse_variable_declarators(name)?;
        Ok(Some(LocalVariableDeclaration {
            modifiers,
            ty,
            declarators,
        }))
    }

    fn parse_for(&mut self) -> Result<Statement, ParseError> {
        self.expect("(")?;

        let enhanced = self.speculate(|p| {
            let modifiers = p.parse_modifiers().ok()?;
            let ty = p.parse_type_ref().ok()?;
            let name = p.expect_identifier().ok()?;
            p.eat(":").then_some((modifiers, ty, name))
        });

        let control = if let Some((modifiers, ty, name)) = enhanced {
            let iterable = self.parse_expression()?;
            ForControl::Enhanced {
                modifiers,
                ty,
                name,
                iterable,
            }
        } else {
            let init = if self.at(";") {
                None
            } else if let Some(declaration) = self.try_local_variable()? {
                Some(ForInit::LocalVariable(declaration))
            } else {
                Some(ForInit::Expressions(self.parse_expression_list()?))
            };
            self.expect(";")?;
            let condition = if self.at(";") {
                None
            } else {
                Some(self.parse_expression()?)
            };
            self.expect(";")?;
            let update = if self.at(")") {
                Vec::new()
            } else {
                self.parse_expression_list()?
            };
            ForControl::Classic {
                init,
                condition,
                update,
            }
        };

        self.expect(")")?;
        let body = Box::new(self.parse_statement()?);
        Ok(Statement::For(ForStatement { control, body }))
    }

    fn parse_try(&mut self) -> Result<Statement, ParseError> {
        let block = self.parse_block()?;
        let mut catches = Vec::new();
        while self.eat_keyword("catch") {
            self.expect("(")?;
            let modifiers = self.parse_modifiers()?;
            let ty = self.parse_type_ref()?;
            let name = self.expect_identifier()?;
            self.expect(")")?;
            let block = self.parse_block()?;
            catches.push(CatchClause {
                modifiers,
                ty,
                name,
                block,
            });
        }
        let finally = if self.eat_keyword("finally") {
            Some(self.parse_block()?)
        } else {
            None
        };
        if catches.is_empty() && finally.is_none() {
            return Err(self.error("expected `catch` or `finally`"));
        }
        Ok(Statement::Try(TryStatement {
            block,
            catches,
            finally,
        }))
    }

    fn parse_par_expression(&mut self) -> Result<Expression, ParseError> {
        self.expect("(")?;
        let expression = self.parse_expression()?;
        self.expect(")")?;
        Ok(expression)
    }

    // Expressions

    pub(crate) fn parse_expression(&mut self) -> Result<Expression, ParseError> {
        let target = self.parse_conditional()?;

        let operator = if ASSIGNMENT_OPERATORS.iter().any(|op| self.at(op)) {
            Some((self.peek().text.clone(), 1))
        } else {
            self.greater_operator()
                .filter(|(text, _)| text.len() > 2 && text.ends_with('='))
        };

        let Some((operator, width)) = operator else {
            return Ok(target);
        };
        for _ in 0..width {
            self.bump();
        }
        let value = self.parse_expression()?;
        Ok(Expression::Assignment {
            target: Box::new(target),
            operator,
            value: Box::new(value),
        })
    }

    fn parse_conditional(&mut self) -> Result<Expression, ParseError> {
        let condition = self.parse_binary(1)?;
        if !self.eat("?") {
            return Ok(condition);
        }
        let then_value = self.parse_expression()?;
        self.expect(":")?;
        let else_value = self.parse_conditional()?;
        Ok(Expression::Conditional {
            condition: Box::new(condition),
            then_value: Box::new(then_value),
            else_value: Box::new(else_value),
        })
    }

    fn peek_binary_operator(&self) -> Option<(String, usize, u8, BinaryKind)> {
        if let Some((text, width)) = self.greater_operator() {
            // `>>=` and `>>>=` are assignments
            let (precedence, kind) = binary_operator(&text)?;
            return Some((text, width, precedence, kind));
        }
        let token = self.peek();
        if token.kind != TokenKind::Punct {
            return None;
        }
        let (precedence, kind) = binary_operator(&token.text)?;
        Some((token.text.clone(), 1, precedence, kind))
    }

    fn parse_binary(&mut self, min_precedence: u8) -> Result<Expression, ParseError> {
        let mut left = self.parse_unary()?;
        loop {
            if self.at_keyword("instanceof") && INSTANCEOF_PRECEDENCE >= min_precedence {
                self.bump();
                let ty = self.parse_type_ref()?;
                left = Expression::InstanceOf {
                    operand: Box::new(left),
                    ty,
                };
                continue;
            }
            let Some((operator, width, precedence, kind)) = self.peek_binary_operator() else {
                break;
            };
            if precedence < min_precedence {
                break;
            }
            for _ in 0..width {
                self.bump();
            }
            let right = self.parse_binary(precedence + 1)?;
            left = Expression::Binary {
                kind,
                operator,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expression, ParseError> {
        const PREFIX: &[&str] = &["+", "-", "!", "~", "++", "--"];
        if PREFIX.iter().any(|op| self.at(op)) {
            let operator = self.bump().text;
            let operand = self.parse_unary()?;
            return Ok(Expression::Unary {
                fixity: Fixity::Prefix,
                operator,
                operand: Box::new(operand),
            });
        }
        if self.at("(") {
            if let Some(ty) = self.try_cast_type() {
                let operand = self.parse_unary()?;
                return Ok(Expression::Cast {
                    ty,
                    operand: Box::new(operand),
                });
            }
        }
        self.parse_postfix()
    }

    /// Consumes `(Type)` when it is followed by something a cast can apply to.
    fn try_cast_type(&mut self) -> Option<TypeRef> {
        self.speculate(|p| {
            p.bump();
            let ty = p.parse_type_ref().ok()?;
            if !p.eat(")") {
                return None;
            }
            let next = p.peek();
            let castable = match next.kind {
                TokenKind::Ident => !next.is_keyword("instanceof"),
                TokenKind::Number | TokenKind::String => true,
                TokenKind::Punct => ["(", "!", "~"].iter().any(|op| next.is_punct(op)),
                TokenKind::Eof => false,
            };
            castable.then_some(ty)
        })
    }

    fn parse_postfix(&mut self) -> Result<Expression, ParseError> {
        let mut expression = self.parse_primary()?;
        loop {
            if self.at(".") || self.at("?.") {
                let navigation = if self.bump().text == "?." {
                    Navigation::SafeDot
                } else {
                    Navigation::Dot
                };
                if self.peek().is_keyword("class") {
                    return Err(self.error("unexpected `class`"));
                }
                let member = self.expect_member_name()?;
                let arguments = if self.at("(") {
                    Some(self.parse_arguments()?)
                } else {
                    None
                };
                expression = Expression::Chain(ChainExpression {
                    receiver: Box::new(expression),
                    link: Link {
                        navigation,
                        member,
                        arguments,
                    },
                });
            } else if self.eat("[") {
                let index = self.parse_expression()?;
                self.expect("]")?;
                expression = Expression::ArrayAccess {
                    array: Box::new(expression),
                    index: Box::new(index),
                };
            } else if self.at("++") || self.at("--") {
                let operator = self.bump().text;
                expression = Expression::Unary {
                    fixity: Fixity::Postfix,
                    operator,
                    operand: Box::new(expression),
                };
            } else {
                return Ok(expression);
            }
        }
    }

    /// Member names after a dot may be any word except `class`.
    fn expect_member_name(&mut self) -> Result<String, ParseError> {
        if self.peek().kind == TokenKind::Ident {
            Ok(self.bump().text)
        } else {
            Err(self.error("expected member name"))
        }
    }

    fn parse_primary(&mut self) -> Result<Expression, ParseError> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Number | TokenKind::String => {
                self.bump();
                Ok(Expression::Primary(Primary::Literal(token.text)))
            }
            TokenKind::Ident => self.parse_word_primary(token),
            TokenKind::Punct if token.text == "(" => {
                self.bump();
                let inner = self.parse_expression()?;
                self.expect(")")?;
                Ok(Expression::Paren(Box::new(inner)))
            }
            TokenKind::Punct if token.text == "[" => self.parse_query(),
            _ => Err(self.error("expected expression")),
        }
    }

    fn parse_word_primary(&mut self, token: Token) -> Result<Expression, ParseError> {
        if ["true", "false", "null"].iter().any(|kw| token.is_keyword(kw)) {
            self.bump();
            return Ok(Expression::Primary(Primary::Literal(token.text)));
        }
        if token.is_keyword("this") || token.is_keyword("super") {
            self.bump();
            if self.at("(") {
                let arguments = self.parse_arguments()?;
                return Ok(Expression::Call {
                    name: token.text,
                    arguments,
                });
            }
            let primary = if token.is_keyword("this") {
                Primary::This
            } else {
                Primary::Super
            };
            return Ok(Expression::Primary(primary));
        }
        if token.is_keyword("new") {
            self.bump();
            return self.parse_creator().map(Expression::New);
        }
        if is_reserved(&token.text) {
            return Err(self.error("expected expression"));
        }

        // Fold a leading dotted path into one primary; the name right before a
        // `(` is left for the chain.
        let mut path = vec![self.bump().text];
        while self.at(".")
            && Self::is_identifier(self.nth(1))
            && !self.nth(2).is_punct("(")
        {
            self.bump();
            path.push(self.bump().text);
        }

        if self.at(".") && self.nth(1).is_keyword("class") {
            self.bump();
            self.bump();
            return Ok(Expression::Primary(Primary::ClassLiteral(TypeRef::path(
                path,
            ))));
        }

        if path.len() == 1 {
            let name = path.remove(0);
            if self.at("(") {
                let arguments = self.parse_arguments()?;
                return Ok(Expression::Call { name, arguments });
            }
            return Ok(Expression::Primary(Primary::Identifier(name)));
        }
        Ok(Expression::Primary(Primary::TypeRef(TypeRef::path(path))))
    }

    fn parse_creator(&mut self) -> Result<Creator, ParseError> {
        let ty = self.parse_type_ref()?;
        let body = if self.at("(") {
            CreatorBody::Arguments(self.parse_arguments()?)
        } else if self.eat("[") {
            let size = self.parse_expression()?;
            self.expect("]")?;
            CreatorBody::ArraySize(Box::new(size))
        } else if self.eat("{") {
            self.parse_initializer_body()?
        } else {
            return Err(self.error("expected `(`, `[` or `{` after type in `new` expression"));
        };
        Ok(Creator { ty, body })
    }

    /// The inside of `{...}` after `new T`, consuming the closing brace.
    fn parse_initializer_body(&mut self) -> Result<CreatorBody, ParseError> {
        if self.eat("}") {
            return Ok(CreatorBody::CollectionInit(Vec::new()));
        }
        let first = self.parse_expression()?;
        if self.eat("=>") {
            let value = self.parse_expression()?;
            let mut entries = vec![(first, value)];
            while self.eat(",") {
                let key = self.parse_expression()?;
                self.expect("=>")?;
                let value = self.parse_expression()?;
                entries.push((key, value));
            }
            self.expect("}")?;
            return Ok(CreatorBody::MapInit(entries));
        }
        let mut elements = vec![first];
        while self.eat(",") {
            elements.push(self.parse_expression()?);
        }
        self.expect("}")?;
        Ok(CreatorBody::CollectionInit(elements))
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expression>, ParseError> {
        self.expect("(")?;
        if self.eat(")") {
            return Ok(Vec::new());
        }
        let arguments = self.parse_expression_list()?;
        self.expect(")")?;
        Ok(arguments)
    }

    fn parse_expression_list(&mut self) -> Result<Vec<Expression>, ParseError> {
        let mut expressions = vec![self.parse_expression()?];
        while self.eat(",") {
            expressions.push(self.parse_expression()?);
        }
        Ok(expressions)
    }

    /// `[SELECT ...]` / `[FIND ...]`, kept as raw source text.
    fn parse_query(&mut self) -> Result<Expression, ParseError> {
        let open = self.expect("[")?;
        let mut depth = 1usize;
        let end = loop {
            let token = self.bump();
            match token.kind {
                TokenKind::Eof => return Err(self.error("unterminated query")),
                TokenKind::Punct if token.text == "[" => depth += 1,
                TokenKind::Punct if token.text == "]" => {
                    depth -= 1;
                    if depth == 0 {
                        break token.end;
                    }
                }
                _ => {}
            }
        };
        Ok(Expression::Primary(Primary::Query(EmbeddedQuery {
            text: self.source[open.start..end].to_string(),
            span: Some(open.span),
        })))
    }
}
