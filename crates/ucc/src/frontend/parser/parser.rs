//! Recursive descent parser for µC

use crate::common::{CompileError, CompileResult, Span};
use crate::frontend::ast::*;
use crate::frontend::lexer::{Lexer, Token, TokenKind};

/// Deepest statement or expression nesting accepted before reporting a syntax error
pub const MAX_NESTING_DEPTH: usize = 256;

/// Recursive descent parser for µC
///
/// Syntax errors are collected, not returned: each failed declaration or
/// statement is recorded and the parser resynchronizes on the next `;`,
/// `}` or type keyword.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    previous_span: Span,
    errors: Vec<CompileError>,
    depth: usize,
}

impl<'a> Parser<'a> {
    /// Create a new parser for the given source
    pub fn new(source: &'a str) -> Self {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token();
        Self {
            lexer,
            current,
            previous_span: Span::default(),
            errors: Vec::new(),
            depth: 0,
        }
    }

    /// Parse a complete translation unit
    pub fn parse(&mut self) -> Program {
        let mut declarations = Vec::new();

        while !self.at_end() {
            let start = self.current.span.start;
            match self.parse_top_level_declaration() {
                Ok(decl) => declarations.push(decl),
                Err(e) => {
                    self.errors.push(e);
                    self.synchronize(start);
                }
            }
        }

        Program::new(declarations)
    }

    /// Syntax errors reported so far
    pub fn take_errors(&mut self) -> Vec<CompileError> {
        std::mem::take(&mut self.errors)
    }

    /// Lexical errors reported by the underlying lexer so far
    pub fn take_lexical_errors(&mut self) -> Vec<CompileError> {
        self.lexer.take_errors()
    }

    // =========================================================================
    // Helper methods
    // =========================================================================

    fn at_end(&self) -> bool {
        self.current.kind.is_eof()
    }

    fn advance(&mut self) -> Token {
        let next = self.lexer.next_token();
        let prev = std::mem::replace(&mut self.current, next);
        self.previous_span = prev.span;
        prev
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current.kind) == std::mem::discriminant(kind)
    }

    fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> CompileResult<Token> {
        if self.check(&kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(&kind.to_string()))
        }
    }

    fn expect_identifier(&mut self) -> CompileResult<(String, Span)> {
        if let TokenKind::Identifier(name) = &self.current.kind {
            let name = name.clone();
            let span = self.advance().span;
            Ok((name, span))
        } else {
            Err(self.unexpected("identifier"))
        }
    }

    fn unexpected(&self, expected: &str) -> CompileError {
        CompileError::syntax(
            format!("expected {}, found {}", expected, self.current.kind),
            self.current.span,
        )
    }

    /// Span from `start` through the last consumed token
    fn span_from(&self, start: Span) -> Span {
        start.merge(self.previous_span)
    }

    fn nesting_error(&self) -> CompileError {
        CompileError::syntax(
            format!("nesting exceeds {} levels", MAX_NESTING_DEPTH),
            self.current.span,
        )
    }

    /// Run `f` one nesting level deeper, failing once the limit is reached
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> CompileResult<T>) -> CompileResult<T> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(self.nesting_error());
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    /// Reject a freshly built node whose tree is deeper than the limit.
    /// Operator chains are built in a loop, so `nested` alone cannot see them.
    fn bounded(&self, expr: Expr) -> CompileResult<Expr> {
        if expr.height > MAX_NESTING_DEPTH {
            return Err(self.nesting_error());
        }
        Ok(expr)
    }

    /// Skip tokens until a likely declaration or statement boundary.
    /// `start` is the offset where the failed construct began; at least one
    /// token is skipped if nothing was consumed since.
    fn synchronize(&mut self, start: usize) {
        if self.current.span.start == start && !self.at_end() {
            if self.check(&TokenKind::Semi) {
                self.advance();
                return;
            }
            self.advance();
        }

        loop {
            match self.current.kind {
                TokenKind::Eof | TokenKind::RBrace => return,
                TokenKind::Semi => {
                    self.advance();
                    return;
                }
                ref kind if kind.is_type_keyword() => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    fn parse_type(&mut self) -> CompileResult<Type> {
        let ty = match self.current.kind {
            TokenKind::Int => Type::Int,
            TokenKind::Char => Type::Char,
            TokenKind::Void => Type::Void,
            _ => return Err(self.unexpected("type")),
        };
        self.advance();
        Ok(ty)
    }

    fn parse_top_level_declaration(&mut self) -> CompileResult<Declaration> {
        let start_span = self.current.span;
        let base_type = self.parse_type()?;
        let (name, name_span) = self.expect_identifier()?;

        if self.check(&TokenKind::LParen) {
            let func = self.parse_function(base_type, name, name_span, start_span)?;
            let span = func.span;
            return Ok(Declaration::new(DeclKind::Function(func), span));
        }

        let vars = self.parse_declarators(base_type, name, name_span)?;
        Ok(Declaration::new(
            DeclKind::Variables(vars),
            self.span_from(start_span),
        ))
    }

    /// Parse the declarator list of a variable declaration whose type and
    /// first name are already consumed, through the closing `;`
    fn parse_declarators(
        &mut self,
        base_type: Type,
        first_name: String,
        first_span: Span,
    ) -> CompileResult<Vec<VarDecl>> {
        let mut vars = Vec::new();
        let (mut name, mut name_span) = (first_name, first_span);

        loop {
            let ty = if self.check(&TokenKind::LBracket) {
                let size = self.parse_array_size()?;
                Type::array_of(base_type.clone(), Some(size))
            } else {
                base_type.clone()
            };
            vars.push(VarDecl::new(name, ty, self.span_from(name_span)));

            if !self.match_token(&TokenKind::Comma) {
                break;
            }
            (name, name_span) = self.expect_identifier()?;
        }

        self.expect(TokenKind::Semi)?;
        Ok(vars)
    }

    /// `'[' '-'? int_lit ']'` in a variable declarator
    fn parse_array_size(&mut self) -> CompileResult<usize> {
        let open = self.expect(TokenKind::LBracket)?.span;
        let negative = self.match_token(&TokenKind::Minus);

        let value = match self.current.kind {
            TokenKind::IntLiteral(value) => {
                self.advance();
                value
            }
            TokenKind::RBracket => {
                return Err(CompileError::syntax(
                    "array size is required here",
                    self.current.span,
                ));
            }
            _ => return Err(self.unexpected("integer constant array size")),
        };
        self.expect(TokenKind::RBracket)?;

        if negative || value == 0 {
            let shown = if negative { -i64::from(value) } else { 0 };
            self.errors.push(CompileError::constant_out_of_range(
                format!("array size must be positive, found {}", shown),
                self.span_from(open),
            ));
            return Ok(1);
        }
        Ok(value as usize)
    }

    fn parse_function(
        &mut self,
        return_type: Type,
        name: String,
        name_span: Span,
        start_span: Span,
    ) -> CompileResult<FuncDecl> {
        let params = self.parse_parameter_list()?;

        let body = match self.current.kind {
            TokenKind::Semi => {
                self.advance();
                None
            }
            TokenKind::LBrace => {
                for param in params.iter().filter(|p| p.name.is_none()) {
                    self.errors.push(CompileError::syntax(
                        format!("parameter name omitted in definition of `{}`", name),
                        param.span,
                    ));
                }
                Some(self.parse_block()?)
            }
            _ => return Err(self.unexpected("';' or '{'")),
        };

        Ok(FuncDecl {
            name,
            return_type,
            params,
            body,
            span: self.span_from(start_span),
            name_span,
            decl: None,
            scope: None,
        })
    }

    fn parse_parameter_list(&mut self) -> CompileResult<Vec<ParamDecl>> {
        self.expect(TokenKind::LParen)?;

        if self.check(&TokenKind::Void) {
            let void_span = self.current.span;
            self.advance();
            if self.match_token(&TokenKind::RParen) {
                return Ok(Vec::new());
            }
            let first = self.parse_parameter_rest(Type::Void, void_span)?;
            return self.parse_remaining_parameters(vec![first]);
        }

        if self.check(&TokenKind::RParen) {
            self.errors.push(CompileError::syntax(
                "empty parameter list; write `(void)` for a function without parameters",
                self.current.span,
            ));
            self.advance();
            return Ok(Vec::new());
        }

        let start = self.current.span;
        let ty = self.parse_type()?;
        let first = self.parse_parameter_rest(ty, start)?;
        self.parse_remaining_parameters(vec![first])
    }

    fn parse_remaining_parameters(
        &mut self,
        mut params: Vec<ParamDecl>,
    ) -> CompileResult<Vec<ParamDecl>> {
        while self.match_token(&TokenKind::Comma) {
            let start = self.current.span;
            let ty = self.parse_type()?;
            params.push(self.parse_parameter_rest(ty, start)?);
        }
        self.expect(TokenKind::RParen)?;
        Ok(params)
    }

    /// Optional name and optional `[size?]` after a parameter's type.
    /// A size is accepted and dropped: array parameters always decay.
    fn parse_parameter_rest(&mut self, ty: Type, start: Span) -> CompileResult<ParamDecl> {
        let name = match &self.current.kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Some(name)
            }
            _ => None,
        };

        let ty = if self.match_token(&TokenKind::LBracket) {
            match self.current.kind {
                TokenKind::RBracket => {}
                TokenKind::IntLiteral(_) => {
                    self.advance();
                }
                _ => return Err(self.unexpected("']' or array size")),
            }
            self.expect(TokenKind::RBracket)?;
            Type::array_of(ty, None)
        } else {
            ty
        };

        Ok(ParamDecl::new(name, ty, self.span_from(start)))
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn parse_block(&mut self) -> CompileResult<Block> {
        let start_span = self.current.span;
        self.expect(TokenKind::LBrace)?;

        let mut stmts = Vec::new();
        let mut seen_statement = false;

        while !self.check(&TokenKind::RBrace) && !self.at_end() {
            let start = self.current.span.start;
            let result = if self.current.kind.is_type_keyword() {
                let result = self.parse_local_declaration();
                if let (true, Ok(decl)) = (seen_statement, &result) {
                    self.errors.push(CompileError::syntax(
                        "declarations must precede statements in a block",
                        decl.span,
                    ));
                }
                result
            } else {
                seen_statement = true;
                self.parse_statement()
            };

            match result {
                Ok(stmt) => stmts.push(stmt),
                Err(e) => {
                    self.errors.push(e);
                    self.synchronize(start);
                }
            }
        }

        self.expect(TokenKind::RBrace)?;
        Ok(Block::new(stmts, self.span_from(start_span)))
    }

    fn parse_local_declaration(&mut self) -> CompileResult<Stmt> {
        let start_span = self.current.span;
        let base_type = self.parse_type()?;
        let (name, name_span) = self.expect_identifier()?;
        if self.check(&TokenKind::LParen) {
            return Err(CompileError::syntax(
                format!("function `{}` cannot be declared inside a block", name),
                name_span,
            ));
        }
        let vars = self.parse_declarators(base_type, name, name_span)?;
        Ok(Stmt::new(StmtKind::Declaration(vars), self.span_from(start_span)))
    }

    fn parse_statement(&mut self) -> CompileResult<Stmt> {
        self.nested(Self::parse_statement_inner)
    }

    fn parse_statement_inner(&mut self) -> CompileResult<Stmt> {
        let start_span = self.current.span;

        match &self.current.kind {
            TokenKind::LBrace => {
                let block = self.parse_block()?;
                let span = block.span;
                Ok(Stmt::new(StmtKind::Block(block), span))
            }

            TokenKind::If => self.parse_if_statement(),
            TokenKind::While => self.parse_while_statement(),
            TokenKind::Return => self.parse_return_statement(),

            TokenKind::Semi => {
                self.advance();
                Ok(Stmt::new(StmtKind::Empty, start_span))
            }

            kind if kind.is_type_keyword() => Err(CompileError::syntax(
                "a declaration is not a statement; declare locals at the start of a block",
                start_span,
            )),

            _ => self.parse_expression_statement(),
        }
    }

    fn parse_if_statement(&mut self) -> CompileResult<Stmt> {
        let start_span = self.current.span;
        self.expect(TokenKind::If)?;
        self.expect(TokenKind::LParen)?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::RParen)?;

        let then_branch = Box::new(self.parse_statement()?);

        // Dangling else binds to the nearest if
        let else_branch = if self.match_token(&TokenKind::Else) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };

        Ok(Stmt::new(
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            },
            self.span_from(start_span),
        ))
    }

    fn parse_while_statement(&mut self) -> CompileResult<Stmt> {
        let start_span = self.current.span;
        self.expect(TokenKind::While)?;
        self.expect(TokenKind::LParen)?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::RParen)?;

        let body = Box::new(self.parse_statement()?);

        Ok(Stmt::new(
            StmtKind::While { condition, body },
            self.span_from(start_span),
        ))
    }

    fn parse_return_statement(&mut self) -> CompileResult<Stmt> {
        let start_span = self.current.span;
        self.expect(TokenKind::Return)?;

        let value = if self.check(&TokenKind::Semi) {
            None
        } else {
            Some(self.parse_expression()?)
        };

        self.expect(TokenKind::Semi)?;
        Ok(Stmt::new(StmtKind::Return(value), self.span_from(start_span)))
    }

    fn parse_expression_statement(&mut self) -> CompileResult<Stmt> {
        let start_span = self.current.span;
        let expr = self.parse_expression()?;
        self.expect(TokenKind::Semi)?;
        Ok(Stmt::new(StmtKind::Expr(expr), self.span_from(start_span)))
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn parse_expression(&mut self) -> CompileResult<Expr> {
        self.nested(Self::parse_assignment_expression)
    }

    fn parse_assignment_expression(&mut self) -> CompileResult<Expr> {
        let target = self.parse_expression_with_precedence(0)?;

        if self.match_token(&TokenKind::Eq) {
            // Right-associative: a = b = c parses as a = (b = c)
            let value = self.parse_expression()?;
            let span = target.span.merge(value.span);
            return self.bounded(Expr::new(
                ExprKind::Assign {
                    target: Box::new(target),
                    value: Box::new(value),
                },
                span,
            ));
        }

        Ok(target)
    }

    /// Left-associative binary operators by precedence climbing
    fn parse_expression_with_precedence(&mut self, min_prec: u8) -> CompileResult<Expr> {
        let mut left = self.parse_unary_expression()?;

        while let Some(op) = binary_operator(&self.current.kind) {
            let prec = op.precedence();
            if prec < min_prec {
                break;
            }

            self.advance();
            let right = self.parse_expression_with_precedence(prec + 1)?;
            let span = left.span.merge(right.span);
            left = self.bounded(Expr::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            ))?;
        }

        Ok(left)
    }

    fn parse_unary_expression(&mut self) -> CompileResult<Expr> {
        let op = match self.current.kind {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Bang => UnaryOp::Not,
            _ => return self.parse_postfix_expression(),
        };
        let start_span = self.advance().span;
        let operand = self.nested(Self::parse_unary_expression)?;
        let span = start_span.merge(operand.span);
        self.bounded(Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            span,
        ))
    }

    fn parse_postfix_expression(&mut self) -> CompileResult<Expr> {
        let mut expr = self.parse_primary_expression()?;

        loop {
            let start_span = expr.span;
            match self.current.kind {
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expression()?;
                    self.expect(TokenKind::RBracket)?;
                    expr = self.bounded(Expr::new(
                        ExprKind::Index {
                            array: Box::new(expr),
                            index: Box::new(index),
                        },
                        self.span_from(start_span),
                    ))?;
                }
                TokenKind::LParen => {
                    self.advance();
                    let args = self.parse_argument_list()?;
                    self.expect(TokenKind::RParen)?;
                    expr = self.bounded(Expr::new(
                        ExprKind::Call {
                            callee: Box::new(expr),
                            args,
                        },
                        self.span_from(start_span),
                    ))?;
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    fn parse_argument_list(&mut self) -> CompileResult<Vec<Expr>> {
        let mut args = Vec::new();

        if self.check(&TokenKind::RParen) {
            return Ok(args);
        }

        loop {
            args.push(self.parse_expression()?);
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }

        Ok(args)
    }

    fn parse_primary_expression(&mut self) -> CompileResult<Expr> {
        let span = self.current.span;

        match &self.current.kind {
            TokenKind::IntLiteral(value) => {
                let value = *value;
                self.advance();
                Ok(Expr::new(ExprKind::IntLiteral(value), span))
            }
            TokenKind::CharLiteral(value) => {
                let value = *value;
                self.advance();
                Ok(Expr::new(ExprKind::CharLiteral(value), span))
            }
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(Expr::identifier(name, span))
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }
            TokenKind::StringLiteral(_) => {
                self.advance();
                Err(CompileError::syntax(
                    "string literals are not supported; build strings element by element",
                    span,
                ))
            }
            _ => Err(self.unexpected("expression")),
        }
    }
}

fn binary_operator(kind: &TokenKind) -> Option<BinaryOp> {
    let op = match kind {
        TokenKind::PipePipe => BinaryOp::LogOr,
        TokenKind::AmpAmp => BinaryOp::LogAnd,
        TokenKind::EqEq => BinaryOp::Eq,
        TokenKind::NotEq => BinaryOp::Ne,
        TokenKind::Lt => BinaryOp::Lt,
        TokenKind::LtEq => BinaryOp::Le,
        TokenKind::Gt => BinaryOp::Gt,
        TokenKind::GtEq => BinaryOp::Ge,
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        _ => return None,
    };
    Some(op)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ErrorKind;
    use pretty_assertions::assert_eq;

    fn parse_ok(source: &str) -> Program {
        let mut parser = Parser::new(source);
        let program = parser.parse();
        let errors = parser.take_errors();
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
        program
    }

    fn parse_errors(source: &str) -> (Program, Vec<CompileError>) {
        let mut parser = Parser::new(source);
        let program = parser.parse();
        (program, parser.take_errors())
    }

    fn function<'p>(program: &'p Program, name: &str) -> &'p FuncDecl {
        program
            .declarations
            .iter()
            .find_map(|d| match &d.kind {
                DeclKind::Function(f) if f.name == name => Some(f),
                _ => None,
            })
            .unwrap_or_else(|| panic!("function {} not found", name))
    }

    fn first_expr(program: &Program, name: &str) -> Expr {
        let body = function(program, name).body.as_ref().unwrap();
        body.stmts
            .iter()
            .find_map(|s| match &s.kind {
                StmtKind::Expr(e) => Some(e.clone()),
                StmtKind::Return(Some(e)) => Some(e.clone()),
                _ => None,
            })
            .unwrap()
    }

    /// Fully parenthesized rendering for precedence checks
    fn show(expr: &Expr) -> String {
        match &expr.kind {
            ExprKind::IntLiteral(n) => n.to_string(),
            ExprKind::CharLiteral(c) => format!("'{}'", c.escape_ascii()),
            ExprKind::Identifier { name, .. } => name.clone(),
            ExprKind::Index { array, index } => format!("{}[{}]", show(array), show(index)),
            ExprKind::Call { callee, args } => format!(
                "{}({})",
                show(callee),
                args.iter().map(show).collect::<Vec<_>>().join(", ")
            ),
            ExprKind::Unary { op, operand } => match op {
                UnaryOp::Neg => format!("(-{})", show(operand)),
                UnaryOp::Not => format!("(!{})", show(operand)),
            },
            ExprKind::Binary { op, left, right } => {
                format!("({} {} {})", show(left), op.symbol(), show(right))
            }
            ExprKind::Assign { target, value } => format!("({} = {})", show(target), show(value)),
        }
    }

    #[test]
    fn test_parse_simple_function() {
        let program = parse_ok("int main(void) { return 0; }");
        assert_eq!(program.declarations.len(), 1);
        let main = function(&program, "main");
        assert_eq!(main.return_type, Type::Int);
        assert!(main.params.is_empty());
        assert!(main.is_definition());
    }

    #[test]
    fn test_parse_globals_and_prototypes() {
        let program = parse_ok("int n, board[8]; char eol[2];\nvoid putint(int);\nvoid sort(char a[], int l);");
        match &program.declarations[0].kind {
            DeclKind::Variables(vars) => {
                assert_eq!(vars.len(), 2);
                assert_eq!(vars[0].ty, Type::Int);
                assert_eq!(vars[1].ty, Type::array_of(Type::Int, Some(8)));
            }
            other => panic!("expected variables, got {:?}", other),
        }
        let putint = function(&program, "putint");
        assert!(putint.params[0].name.is_none());
        let sort = function(&program, "sort");
        assert_eq!(sort.signature().to_string(), "void(char[], int)");
        assert!(!sort.is_definition());
    }

    #[test]
    fn test_parameter_array_size_is_dropped() {
        let program = parse_ok("void f(char s[10]) { }");
        assert_eq!(function(&program, "f").params[0].ty, Type::array_of(Type::Char, None));
    }

    #[test]
    fn test_precedence_and_associativity() {
        let program = parse_ok(
            "int f(void) { x = y = a || b && c == d < e + g * -h[1]; return 1 - 2 - 3 / 4 / 5; }",
        );
        let body = function(&program, "f").body.as_ref().unwrap();
        let shown: Vec<String> = body
            .stmts
            .iter()
            .map(|s| match &s.kind {
                StmtKind::Expr(e) | StmtKind::Return(Some(e)) => show(e),
                other => panic!("unexpected {:?}", other),
            })
            .collect();
        assert_eq!(
            shown,
            vec![
                "(x = (y = (a || (b && (c == (d < (e + (g * (-h[1])))))))))".to_string(),
                "((1 - 2) - ((3 / 4) / 5))".to_string(),
            ]
        );
    }

    #[test]
    fn test_calls_and_parentheses() {
        let program = parse_ok("int f(void) { putint((1 + 2) * 3, !g(a, b[i]), h()); }");
        assert_eq!(
            show(&first_expr(&program, "f")),
            "putint(((1 + 2) * 3), (!g(a, b[i])), h())"
        );
    }

    #[test]
    fn test_dangling_else_binds_nearest_if() {
        let program = parse_ok("void f(void) { if (a) if (b) x = 1; else x = 2; }");
        let body = function(&program, "f").body.as_ref().unwrap();
        match &body.stmts[0].kind {
            StmtKind::If {
                then_branch,
                else_branch,
                ..
            } => {
                assert!(else_branch.is_none());
                assert!(matches!(
                    &then_branch.kind,
                    StmtKind::If { else_branch: Some(_), .. }
                ));
            }
            other => panic!("expected if, got {:?}", other),
        }
    }

    #[test]
    fn test_recovers_and_reports_each_error() {
        let (program, errors) = parse_errors(
            "int a\nint main(void) { x = ; y = 1; while (1 { } return 0; }\nint b;",
        );
        assert!(errors.len() >= 3, "{:?}", errors);
        assert!(errors.iter().all(|e| e.kind() == Some(ErrorKind::Syntax)));
        // The declaration after the broken body is still parsed
        assert!(program.declarations.iter().any(|d| matches!(
            &d.kind,
            DeclKind::Variables(v) if v[0].name == "b"
        )));
    }

    #[test]
    fn test_empty_parameter_list_rejected() {
        let (_, errors) = parse_errors("int main() { return 0; }");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message().contains("(void)"));
    }

    #[test]
    fn test_unnamed_parameter_in_definition() {
        let (_, errors) = parse_errors("int f(int) { return 0; }");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message().contains("parameter name omitted"));
    }

    #[test]
    fn test_array_size_checks() {
        let (_, errors) = parse_errors("int a[-3]; char b[0]; int c[];");
        let kinds: Vec<_> = errors.iter().filter_map(|e| e.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                ErrorKind::ConstantOutOfRange,
                ErrorKind::ConstantOutOfRange,
                ErrorKind::Syntax
            ]
        );
    }

    #[test]
    fn test_declaration_after_statement_is_kept() {
        let (program, errors) = parse_errors("void f(void) { int x; x = 1; int y; y = x; }");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message().contains("precede statements"));
        let body = function(&program, "f").body.as_ref().unwrap();
        assert_eq!(body.stmts.len(), 4);
    }

    #[test]
    fn test_string_literal_rejected() {
        let (_, errors) = parse_errors("void f(void) { putstring(\"hi\"); }");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message().contains("string literals"));
    }

    #[test]
    fn test_operator_chain_height_is_bounded() {
        let chain = |terms: usize| vec!["1"; terms].join(" + ");

        let program = parse_ok(&format!("int f(void) {{ return {}; }}", chain(MAX_NESTING_DEPTH)));
        let body = function(&program, "f").body.as_ref().unwrap();
        match &body.stmts[0].kind {
            StmtKind::Return(Some(value)) => assert_eq!(value.height, MAX_NESTING_DEPTH),
            other => panic!("expected return, got {:?}", other),
        }

        for terms in [MAX_NESTING_DEPTH + 2, 20_000] {
            let source = format!("int f(void) {{ return {}; }} int g(void) {{ return 1; }}", chain(terms));
            let (program, errors) = parse_errors(&source);
            assert_eq!(errors.len(), 1, "{} terms", terms);
            assert!(errors[0].message().contains("nesting exceeds"));
            // Recovery resumes at the next declaration
            assert!(function(&program, "g").body.is_some());
        }
    }

    #[test]
    fn test_unary_and_assignment_height() {
        let (_, errors) = parse_errors(&format!("int f(void) {{ return {}1; }}", "-".repeat(MAX_NESTING_DEPTH + 1)));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message().contains("nesting exceeds"));

        let assignments = "x = ".repeat(MAX_NESTING_DEPTH + 1);
        let (_, errors) = parse_errors(&format!("void f(void) {{ int x; {}1; }}", assignments));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message().contains("nesting exceeds"));
    }

    #[test]
    fn test_spans_cover_constructs() {
        let source = "int main(void) { return 0; }";
        let program = parse_ok(source);
        let main = function(&program, "main");
        assert_eq!(&source[main.span.range()], source);
        assert_eq!(&source[main.name_span.range()], "main");
        let ret = &main.body.as_ref().unwrap().stmts[0];
        assert_eq!(&source[ret.span.range()], "return 0;");
    }
}
