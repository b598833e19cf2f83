use crate::error::{RenderError, RenderResult};
use crate::parser::*;
use crate::renderer::chain::{ChainAnalyzer, ChainLayout};
use crate::renderer::components::*;
use crate::renderer::traits::*;
use tracing::{debug, trace};

fn render_parameters(
    parameters: &[FormalParameter],
    context: &RenderContext<'_>,
) -> RenderResult<String> {
    Ok(format!("({})", render_joined(parameters, context, ", ")?))
}

fn render_arguments(arguments: &[Expression], context: &RenderContext<'_>) -> RenderResult<String> {
    Ok(format!("({})", render_joined(arguments, &context.inline(), ", ")?))
}

/// Keeps `- -x` and `+ ++x` from fusing into a different operator.
fn render_prefix(operator: &str, operand: &str) -> String {
    let fuses = match (operator.chars().last(), operand.chars().next()) {
        (Some(last), Some(first)) => last == first && (last == '+' || last == '-'),
        _ => false,
    };
    if fuses {
        format!("{} {}", operator, operand)
    } else {
        format!("{}{}", operator, operand)
    }
}

/// Statement bodies of `if`, `while` and `for` always get braces.
fn render_braced(statement: &Statement, context: &RenderContext<'_>) -> RenderResult<String> {
    match statement {
        Statement::Block(block) => block.render(context),
        other => IndentationHelper::braced_body(context, |inner| other.render(inner)),
    }
}

fn render_declarators(
    node: NodeKind,
    declarators: &[VariableDeclarator],
    context: &RenderContext<'_>,
) -> RenderResult<String> {
    if declarators.is_empty() {
        return Err(RenderError::missing(node, "no variable declarators"));
    }
    render_joined(declarators, context, ", ")
}

impl Render for CompilationUnit {
    fn render(&self, context: &RenderContext<'_>) -> RenderResult<String> {
        self.declaration.render(context)
    }
}

impl Render for TypeDeclaration {
    fn render(&self, context: &RenderContext<'_>) -> RenderResult<String> {
        debug!(
            kind = %self.kind(),
            name = self.name(),
            depth = context.depth,
            "rendering type declaration"
        );
        match self {
            TypeDeclaration::Class(class) => class.render(context),
            TypeDeclaration::Interface(interface) => interface.render(context),
            TypeDeclaration::Enum(enumeration) => enumeration.render(context),
        }
    }
}

impl Render for ClassDeclaration {
    fn render(&self, context: &RenderContext<'_>) -> RenderResult<String> {
        let modifier_renderer = ModifierRenderer;
        let type_renderer = TypeRenderer;

        let mut signature = modifier_renderer.render_modifiers(&self.modifiers);
        signature.push_str("class ");
        signature.push_str(&self.name);

        if let Some(extends) = &self.extends {
            signature.push_str(" extends ");
            signature.push_str(&type_renderer.render_type(extends)?);
        }

        if !self.implements.is_empty() {
            signature.push_str(" implements ");
            signature.push_str(&type_renderer.render_type_list(&self.implements)?);
        }

        signature.push(' ');
        signature.push_str(&IndentationHelper::braced_body(context, |inner| {
            render_joined(&self.body, inner, "\n")
        })?);
        Ok(signature)
    }
}

impl Render for InterfaceDeclaration {
    fn render(&self, context: &RenderContext<'_>) -> RenderResult<String> {
        let modifier_renderer = ModifierRenderer;
        let type_renderer = TypeRenderer;

        let mut signature = modifier_renderer.render_modifiers(&self.modifiers);
        signature.push_str("interface ");
        signature.push_str(&self.name);

        if !self.extends.is_empty() {
            signature.push_str(" extends ");
            signature.push_str(&type_renderer.render_type_list(&self.extends)?);
        }

        signature.push(' ');
        signature.push_str(&IndentationHelper::braced_body(context, |inner| {
            render_joined(&self.body, inner, "\n")
        })?);
        Ok(signature)
    }
}

impl Render for EnumDeclaration {
    fn render(&self, _context: &RenderContext<'_>) -> RenderResult<String> {
        // Constants stay on the declaration line; enums get no body indentation.
        Ok(format!(
            "{}enum {} {{{}}}",
            ModifierRenderer.render_modifiers(&self.modifiers),
            self.name,
            self.constants.join(", ")
        ))
    }
}

impl Render for Member {
    fn render(&self, context: &RenderContext<'_>) -> RenderResult<String> {
        trace!(kind = %self.kind(), depth = context.depth, "rendering member");
        match self {
            Member::Method(method) => method.render(context),
            Member::Field(field) => field.render(context),
            Member::Constructor(constructor) => constructor.render(context),
            Member::Property(property) => property.render(context),
            Member::Initializer(initializer) => initializer.render(context),
            Member::Declaration(declaration) => declaration.render(context),
            Member::Empty => Ok(";".to_string()),
        }
    }
}

impl Render for MethodDeclaration {
    fn render(&self, context: &RenderContext<'_>) -> RenderResult<String> {
        let type_renderer = TypeRenderer;

        let mut output = ModifierRenderer.render_modifiers(&self.modifiers);
        match &self.return_type {
            Some(ty) => output.push_str(&type_renderer.render_type(ty)?),
            None => output.push_str("void"),
        }
        output.push(' ');
        output.push_str(&self.name);
        output.push_str(&render_parameters(&self.parameters, context)?);

        match &self.body {
            Some(body) => {
                output.push(' ');
                output.push_str(&body.render(context)?);
            }
            None => output.push(';'),
        }
        Ok(output)
    }
}

impl Render for FormalParameter {
    fn render(&self, _context: &RenderContext<'_>) -> RenderResult<String> {
        Ok(format!(
            "{}{} {}",
            ModifierRenderer.render_modifiers(&self.modifiers),
            TypeRenderer.render_type(&self.ty)?,
            self.name
        ))
    }
}

impl Render for FieldDeclaration {
    fn render(&self, context: &RenderContext<'_>) -> RenderResult<String> {
        Ok(format!(
            "{}{} {};",
            ModifierRenderer.render_modifiers(&self.modifiers),
            TypeRenderer.render_type(&self.ty)?,
            render_declarators(NodeKind::Field, &self.declarators, context)?
        ))
    }
}

impl Render for VariableDeclarator {
    fn render(&self, context: &RenderContext<'_>) -> RenderResult<String> {
        match &self.initializer {
            Some(value) => Ok(format!("{} = {}", self.name, value.render(context)?)),
            None => Ok(self.name.clone()),
        }
    }
}

impl Render for ConstructorDeclaration {
    fn render(&self, context: &RenderContext<'_>) -> RenderResult<String> {
        if self.name.is_empty() {
            return Err(RenderError::missing(NodeKind::Constructor, "constructor has no name"));
        }
        Ok(format!(
            "{}{}{} {}",
            ModifierRenderer.render_modifiers(&self.modifiers),
            self.name.join("."),
            render_parameters(&self.parameters, context)?,
            self.body.render(context)?
        ))
    }
}

impl Render for PropertyDeclaration {
    fn render(&self, context: &RenderContext<'_>) -> RenderResult<String> {
        let mut output = ModifierRenderer.render_modifiers(&self.modifiers);
        output.push_str(&TypeRenderer.render_type(&self.ty)?);
        output.push(' ');
        output.push_str(&self.name);
        output.push(' ');
        output.push_str(&IndentationHelper::braced_body(context, |inner| {
            render_joined(&self.accessors, inner, "\n")
        })?);
        Ok(output)
    }
}

impl Render for PropertyAccessor {
    fn render(&self, context: &RenderContext<'_>) -> RenderResult<String> {
        let mut output = ModifierRenderer.render_modifiers(&self.modifiers);
        output.push_str(self.kind.keyword());
        match &self.body {
            Some(body) => {
                output.push(' ');
                output.push_str(&body.render(context)?);
            }
            None => output.push(';'),
        }
        Ok(output)
    }
}

impl Render for Initializer {
    fn render(&self, context: &RenderContext<'_>) -> RenderResult<String> {
        let body = self.body.render(context)?;
        if self.is_static {
            Ok(format!("static {}", body))
        } else {
            Ok(body)
        }
    }
}

impl Render for Block {
    fn render(&self, context: &RenderContext<'_>) -> RenderResult<String> {
        IndentationHelper::braced_body(context, |inner| {
            render_joined(&self.statements, inner, "\n")
        })
    }
}

impl Render for Statement {
    fn render(&self, context: &RenderContext<'_>) -> RenderResult<String> {
        match self {
            Statement::Block(block) => block.render(context),
            Statement::If(statement) => statement.render(context),
            Statement::While(statement) => Ok(format!(
                "while ({}) {}",
                statement.condition.render(&context.inline())?,
                render_braced(&statement.body, context)?
            )),
            Statement::For(statement) => statement.render(context),
            Statement::Try(statement) => statement.render(context),
            Statement::Return(Some(value)) => Ok(format!("return {};", value.render(context)?)),
            Statement::Return(None) => Ok("return;".to_string()),
            Statement::Throw(value) => Ok(format!("throw {};", value.render(context)?)),
            Statement::Break => Ok("break;".to_string()),
            Statement::Continue => Ok("continue;".to_string()),
            Statement::Dml(statement) => Ok(format!(
                "{} {};",
                statement.operation,
                statement.expression.render(context)?
            )),
            Statement::LocalVariable(declaration) => {
                Ok(format!("{};", declaration.render(context)?))
            }
            Statement::Expression(expression) => Ok(format!("{};", expression.render(context)?)),
        }
    }
}

impl Render for IfStatement {
    fn render(&self, context: &RenderContext<'_>) -> RenderResult<String> {
        let mut output = format!(
            "if ({}) {}",
            self.condition.render(&context.inline())?,
            render_braced(&self.then_branch, context)?
        );

        if let Some(else_branch) = &self.else_branch {
            output.push_str(" else ");
            match &**else_branch {
                // keeps `} else if (...) {` on one line
                Statement::If(nested) => output.push_str(&nested.render(context)?),
                other => output.push_str(&render_braced(other, context)?),
            }
        }
        Ok(output)
    }
}

impl Render for ForStatement {
    fn render(&self, context: &RenderContext<'_>) -> RenderResult<String> {
        let header = context.inline();
        let control = match &self.control {
            ForControl::Enhanced {
                modifiers,
                ty,
                name,
                iterable,
            } => format!(
                "{}{} {} : {}",
                ModifierRenderer.render_modifiers(modifiers),
                TypeRenderer.render_type(ty)?,
                name,
                iterable.render(&header)?
            ),
            ForControl::Classic {
                init,
                condition,
                update,
            } => {
                let mut control = match init {
                    Some(ForInit::LocalVariable(declaration)) => declaration.render(&header)?,
                    Some(ForInit::Expressions(expressions)) => {
                        render_joined(expressions, &header, ", ")?
                    }
                    None => String::new(),
                };
                control.push(';');
                if let Some(condition) = condition {
                    control.push(' ');
                    control.push_str(&condition.render(&header)?);
                }
                control.push(';');
                if !update.is_empty() {
                    control.push(' ');
                    control.push_str(&render_joined(update, &header, ", ")?);
                }
                control
            }
        };
        Ok(format!("for ({}) {}", control, render_braced(&self.body, context)?))
    }
}

impl Render for TryStatement {
    fn render(&self, context: &RenderContext<'_>) -> RenderResult<String> {
        let mut output = format!("try {}", self.block.render(context)?);
        for clause in &self.catches {
            output.push_str(&format!(
                " catch ({}{} {}) {}",
                ModifierRenderer.render_modifiers(&clause.modifiers),
                TypeRenderer.render_type(&clause.ty)?,
                clause.name,
                clause.block.render(context)?
            ));
        }
        if let Some(finally) = &self.finally {
            output.push_str(" finally ");
            output.push_str(&finally.render(context)?);
        }
        Ok(output)
    }
}

impl Render for LocalVariableDeclaration {
    fn render(&self, context: &RenderContext<'_>) -> RenderResult<String> {
        Ok(format!(
            "{}{} {}",
            ModifierRenderer.render_modifiers(&self.modifiers),
            TypeRenderer.render_type(&self.ty)?,
            render_declarators(NodeKind::LocalVariable, &self.declarators, context)?
        ))
    }
}

impl Render for Expression {
    fn render(&self, context: &RenderContext<'_>) -> RenderResult<String> {
        match self {
            Expression::Assignment {
                target,
                operator,
                value,
            } => {
                if operator.is_empty() {
                    return Err(RenderError::missing(NodeKind::Assignment, "no operator text"));
                }
                Ok(format!(
                    "{} {} {}",
                    target.render(context)?,
                    operator,
                    value.render(context)?
                ))
            }
            Expression::Conditional {
                condition,
                then_value,
                else_value,
            } => Ok(format!(
                "{} ? {} : {}",
                condition.render(context)?,
                then_value.render(context)?,
                else_value.render(context)?
            )),
            Expression::Binary {
                operator,
                left,
                right,
                ..
            } => {
                if operator.is_empty() {
                    return Err(RenderError::missing(NodeKind::Binary, "no operator text"));
                }
                Ok(format!(
                    "{} {} {}",
                    left.render(context)?,
                    operator,
                    right.render(context)?
                ))
            }
            Expression::Unary {
                fixity,
                operator,
                operand,
            } => {
                if operator.is_empty() {
                    return Err(RenderError::missing(NodeKind::Unary, "no operator text"));
                }
                let operand = operand.render(context)?;
                match fixity {
                    Fixity::Prefix => Ok(render_prefix(operator, &operand)),
                    Fixity::Postfix => Ok(format!("{}{}", operand, operator)),
                }
            }
            Expression::Cast { ty, operand } => Ok(format!(
                "({}){}",
                TypeRenderer.render_type(ty)?,
                operand.render(context)?
            )),
            Expression::InstanceOf { operand, ty } => Ok(format!(
                "{} instanceof {}",
                operand.render(context)?,
                TypeRenderer.render_type(ty)?
            )),
            Expression::New(creator) => Ok(format!("new {}", creator.render(context)?)),
            Expression::ArrayAccess { array, index } => Ok(format!(
                "{}[{}]",
                array.render(context)?,
                index.render(context)?
            )),
            Expression::Chain(chain) => chain.render(context),
            Expression::Call { name, arguments } => {
                Ok(format!("{}{}", name, render_arguments(arguments, context)?))
            }
            Expression::Paren(inner) => Ok(format!("({})", inner.render(context)?)),
            Expression::Primary(primary) => primary.render(context),
        }
    }
}

impl Render for Creator {
    fn render(&self, context: &RenderContext<'_>) -> RenderResult<String> {
        let ty = TypeRenderer.render_type(&self.ty)?;
        let context = &context.inline();
        let body = match &self.body {
            CreatorBody::Arguments(arguments) => render_arguments(arguments, context)?,
            CreatorBody::ArraySize(size) => format!("[{}]", size.render(context)?),
            CreatorBody::CollectionInit(elements) => {
                format!("{{{}}}", render_joined(elements, context, ", ")?)
            }
            CreatorBody::MapInit(entries) => {
                let entries = entries
                    .iter()
                    .map(|(key, value)| -> RenderResult<String> {
                        Ok(format!("{} => {}", key.render(context)?, value.render(context)?))
                    })
                    .collect::<RenderResult<Vec<_>>>()?;
                format!("{{{}}}", entries.join(", "))
            }
        };
        Ok(format!("{}{}", ty, body))
    }
}

impl Render for ChainExpression {
    fn render(&self, context: &RenderContext<'_>) -> RenderResult<String> {
        let link_count = ChainAnalyzer::link_count(self);
        let call_links = ChainAnalyzer::call_link_count(self);
        let layout = if context.inline_chains {
            ChainLayout::Inline
        } else {
            ChainLayout::for_links(call_links, context.config.chain_threshold)
        };
        debug!(
            links = link_count,
            call_links,
            ?layout,
            depth = context.depth,
            "chain layout"
        );

        let (receiver, links) = ChainAnalyzer::spine(self);
        let mut output = receiver.render(context)?;
        for link in links {
            match layout {
                ChainLayout::Inline => output.push_str(&link.render(context)?),
                ChainLayout::Exploded => {
                    output.push('\n');
                    output.push_str(&context.with_indent(|inner| link.render(inner))?);
                }
            }
        }
        Ok(output)
    }
}

impl Render for Link {
    fn render(&self, context: &RenderContext<'_>) -> RenderResult<String> {
        if self.member.is_empty() {
            return Err(RenderError::missing(NodeKind::Chain, "chain link has no member name"));
        }
        let mut output = format!("{}{}", self.navigation.as_str(), self.member);
        if let Some(arguments) = &self.arguments {
            output.push_str(&render_arguments(arguments, context)?);
        }
        Ok(output)
    }
}

impl Render for Primary {
    fn render(&self, _context: &RenderContext<'_>) -> RenderResult<String> {
        match self {
            Primary::Literal(text) | Primary::Identifier(text) => Ok(text.clone()),
            Primary::This => Ok("this".to_string()),
            Primary::Super => Ok("super".to_string()),
            Primary::TypeRef(ty) => TypeRenderer.render_type(ty),
            Primary::ClassLiteral(ty) => Ok(format!("{}.class", TypeRenderer.render_type(ty)?)),
            Primary::Query(query) => {
                debug!(query = %query.text, "no layout rule for embedded query");
                Err(RenderError::unsupported(NodeKind::EmbeddedQuery, query.span))
            }
        }
    }
}
