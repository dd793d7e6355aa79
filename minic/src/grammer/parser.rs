use super::ast::{Block, Expr, ExprKind, FunDecl, Op, Program, Stmt, StructTypeDecl, Type, VarDecl};
use super::parsercore::Parser;
use super::token::{Pos, Token, TokenKind::*};
use crate::error::{Diagnostic, Error};
use crate::{check, expect, optional, recover, repeat};

impl<I: Iterator<Item = Token>> Parser<I> {
    pub fn parse(mut self) -> (Program, Vec<Diagnostic>) {
        let program = self.parse_program();
        (program, self.into_errors())
    }
}

// ----------------------------------------------------------------------------
// Declarations
// ----------------------------------------------------------------------------

impl<I: Iterator<Item = Token>> Parser<I> {
    /// program = { include } { structdecl } { vardecl } { fundecl } EOF
    pub fn parse_program(&mut self) -> Program {
        while check!(self, KwInclude) {
            let start = self.position();
            if let Err(err) = self.parse_include() {
                self.error(err);
                self.synchronize_top(start);
            }
        }

        let mut structs = Vec::new();
        while self.at_struct_decl() {
            let start = self.position();
            match self.parse_struct_decl() {
                Ok(decl) => structs.push(decl),
                Err(err) => {
                    self.error(err);
                    self.synchronize_top(start);
                }
            }
        }

        let mut globals = Vec::new();
        while self.peek().kind.is_type_start() && !self.at_fun_decl() {
            let start = self.position();
            match self.parse_var_decl() {
                Ok(decl) => globals.push(decl),
                Err(err) => {
                    self.error(err);
                    self.synchronize_top(start);
                }
            }
        }

        let mut funs = Vec::new();
        while !check!(self, Eof) {
            let start = self.position();
            match self.parse_fun_decl() {
                Ok(decl) => funs.push(decl),
                Err(err) => {
                    self.error(err);
                    self.synchronize_top(start);
                }
            }
        }

        Program {
            structs,
            globals,
            funs,
        }
    }

    fn synchronize_top(&mut self, start: usize) {
        if self.position() == start {
            self.next();
        }
        recover!(self, KwInt | KwChar | KwVoid | KwStruct);
    }

    /// "struct" ident "{"
    fn at_struct_decl(&mut self) -> bool {
        check!(self, KwStruct) && matches!(self.lookahead(2).kind, LCurly)
    }

    /// type-prefix { "*" } ident "("
    fn at_fun_decl(&mut self) -> bool {
        let mut i = match self.peek().kind.clone() {
            KwStruct => 2,
            KwInt | KwChar | KwVoid => 1,
            _ => return false,
        };
        while matches!(self.lookahead(i).kind, Star) {
            i += 1;
        }
        matches!(self.lookahead(i).kind, Ident(_)) && matches!(self.lookahead(i + 1).kind, LParen)
    }

    /// include = "#include" string
    fn parse_include(&mut self) -> Result<(), Error> {
        expect!(self, KwInclude)?;
        expect!(self, Text(_))?;
        Ok(())
    }

    /// structdecl = "struct" ident "{" vardecl { vardecl } "}" ";"
    fn parse_struct_decl(&mut self) -> Result<StructTypeDecl, Error> {
        let pos = expect!(self, KwStruct)?.pos;
        let (name, _) = self.parse_ident()?;
        expect!(self, LCurly)?;
        let mut fields = vec![self.parse_var_decl()?];
        fields.extend(repeat!(self, self.parse_var_decl(), RCurly | Eof));
        expect!(self, RCurly)?;
        expect!(self, Semicolon)?;
        Ok(StructTypeDecl { name, fields, pos })
    }

    /// vardecl = type ident { "[" number "]" } ";"
    fn parse_var_decl(&mut self) -> Result<VarDecl, Error> {
        let decl = self.parse_declarator()?;
        expect!(self, Semicolon)?;
        Ok(decl)
    }

    /// declarator = type ident { "[" number "]" }
    fn parse_declarator(&mut self) -> Result<VarDecl, Error> {
        let ty = self.parse_type()?;
        let (name, pos) = self.parse_ident()?;
        let mut dims = Vec::new();
        while optional!(self, LBracket).is_some() {
            dims.push(self.parse_size()?);
            expect!(self, RBracket)?;
        }
        // int a[2][3] is an array of 2 arrays of 3 ints
        let ty = dims.into_iter().rev().fold(ty, Type::array);
        Ok(VarDecl {
            id: self.decl_id(),
            ty,
            name,
            pos,
        })
    }

    /// fundecl = type ident "(" [ declarator { "," declarator } ] ")" block
    fn parse_fun_decl(&mut self) -> Result<FunDecl, Error> {
        let ret = self.parse_type()?;
        let (name, pos) = self.parse_ident()?;
        expect!(self, LParen)?;
        let params = repeat!(self, self.parse_declarator(), Comma, RParen);
        expect!(self, RParen)?;
        let body = self.parse_block()?;
        Ok(FunDecl {
            ret,
            name,
            params,
            body,
            pos,
        })
    }

    /// type = ( "int" | "char" | "void" | "struct" ident ) { "*" }
    fn parse_type(&mut self) -> Result<Type, Error> {
        let mut ty = match self.peek().kind.clone() {
            KwInt => {
                self.next();
                Type::Int
            }
            KwChar => {
                self.next();
                Type::Char
            }
            KwVoid => {
                self.next();
                Type::Void
            }
            KwStruct => {
                self.next();
                let (name, _) = self.parse_ident()?;
                Type::Struct(name)
            }
            _ => return Err(self.unexpected("type")),
        };
        while optional!(self, Star).is_some() {
            ty = Type::pointer(ty);
        }
        Ok(ty)
    }

    fn parse_ident(&mut self) -> Result<(String, Pos), Error> {
        match self.peek().kind.clone() {
            Ident(name) => Ok((name, self.next().pos)),
            _ => Err(self.unexpected("identifier")),
        }
    }

    fn parse_size(&mut self) -> Result<usize, Error> {
        match self.peek().kind.clone() {
            Number(_, size) => {
                self.next();
                Ok(size)
            }
            _ => Err(self.unexpected("array size")),
        }
    }
}

// ----------------------------------------------------------------------------
// Statements
// ----------------------------------------------------------------------------

impl<I: Iterator<Item = Token>> Parser<I> {
    /// block = "{" { vardecl } { stmt } "}"
    fn parse_block(&mut self) -> Result<Block, Error> {
        expect!(self, LCurly)?;

        let mut vars = Vec::new();
        while self.peek().kind.is_type_start() {
            let start = self.position();
            match self.parse_var_decl() {
                Ok(decl) => vars.push(decl),
                Err(err) => {
                    self.error(err);
                    self.synchronize_stmt(start);
                }
            }
        }

        let mut stmts = Vec::new();
        while !check!(self, RCurly | Eof) {
            let start = self.position();
            match self.parse_stmt() {
                Ok(stmt) => stmts.push(stmt),
                Err(err) => {
                    self.error(err);
                    self.synchronize_stmt(start);
                }
            }
        }

        expect!(self, RCurly)?;
        Ok(Block { vars, stmts })
    }

    fn synchronize_stmt(&mut self, start: usize) {
        recover!(self, Semicolon | RCurly);
        if optional!(self, Semicolon).is_none() && self.position() == start {
            // Stuck at a closing brace that the enclosing block will take
            if !check!(self, RCurly | Eof) {
                self.next();
            }
        }
    }

    /// stmt = block
    ///      | "while" "(" expr ")" stmt
    ///      | "if" "(" expr ")" stmt [ "else" stmt ]
    ///      | "return" [ expr ] ";"
    ///      | expr [ "=" expr ] ";"
    fn parse_stmt(&mut self) -> Result<Stmt, Error> {
        match self.peek().kind.clone() {
            // Block statement
            LCurly => Ok(Stmt::Block(self.parse_block()?)),

            // Loop statement: "while" "(" expr ")" stmt
            KwWhile => {
                expect!(self, KwWhile)?;
                expect!(self, LParen)?;
                let cond = self.parse_expr()?;
                expect!(self, RParen)?;
                let body = Box::new(self.parse_stmt()?);
                Ok(Stmt::While(cond, body))
            }

            // Conditional statement: "if" "(" expr ")" stmt [ "else" stmt ]
            KwIf => {
                expect!(self, KwIf)?;
                expect!(self, LParen)?;
                let cond = self.parse_expr()?;
                expect!(self, RParen)?;
                let then = Box::new(self.parse_stmt()?);
                let els = optional!(self, KwElse, Box::new(self.parse_stmt()?));
                Ok(Stmt::If(cond, then, els))
            }

            // Return statement: "return" [ expr ] ";"
            KwReturn => {
                let pos = expect!(self, KwReturn)?.pos;
                let expr = if check!(self, Semicolon) {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                expect!(self, Semicolon)?;
                Ok(Stmt::Return(expr, pos))
            }

            _ => {
                let expr = self.parse_expr()?;
                if optional!(self, Equal).is_some() {
                    // Assignment statement: expr "=" expr ";"
                    let rhs = self.parse_expr()?;
                    expect!(self, Semicolon)?;
                    Ok(Stmt::Assign(expr, rhs))
                } else {
                    // Expression statement: expr ";"
                    expect!(self, Semicolon)?;
                    Ok(Stmt::Expr(expr))
                }
            }
        }
    }
}

// ----------------------------------------------------------------------------
// Expressions
// ----------------------------------------------------------------------------

impl<I: Iterator<Item = Token>> Parser<I> {
    fn expr(&mut self, kind: ExprKind, pos: Pos) -> Expr {
        Expr {
            id: self.node_id(),
            kind,
            pos,
        }
    }

    fn binop(&mut self, op: Op, lhs: Expr, rhs: Expr) -> Expr {
        let pos = lhs.pos;
        self.expr(ExprKind::BinOp(op, Box::new(lhs), Box::new(rhs)), pos)
    }

    /// expr = or-expr
    pub fn parse_expr(&mut self) -> Result<Expr, Error> {
        self.parse_or_expr()
    }

    /// or-expr = and-expr { "||" and-expr }
    fn parse_or_expr(&mut self) -> Result<Expr, Error> {
        let mut lhs = self.parse_and_expr()?;
        while optional!(self, PipePipe).is_some() {
            let rhs = self.parse_and_expr()?;
            lhs = self.binop(Op::Or, lhs, rhs);
        }
        Ok(lhs)
    }

    /// and-expr = eq-expr { "&&" eq-expr }
    fn parse_and_expr(&mut self) -> Result<Expr, Error> {
        let mut lhs = self.parse_eq_expr()?;
        while optional!(self, AmpAmp).is_some() {
            let rhs = self.parse_eq_expr()?;
            lhs = self.binop(Op::And, lhs, rhs);
        }
        Ok(lhs)
    }

    /// eq-expr = relat-expr { ( "==" | "!=" ) relat-expr }
    fn parse_eq_expr(&mut self) -> Result<Expr, Error> {
        let mut lhs = self.parse_relat_expr()?;
        loop {
            let op = match self.peek().kind.clone() {
                EqualEqual => Op::Eq,
                ExclEqual => Op::Ne,
                _ => return Ok(lhs),
            };
            self.next();
            let rhs = self.parse_relat_expr()?;
            lhs = self.binop(op, lhs, rhs);
        }
    }

    /// relat-expr = add-expr { ( "<" | "<=" | ">" | ">=" ) add-expr }
    fn parse_relat_expr(&mut self) -> Result<Expr, Error> {
        let mut lhs = self.parse_add_expr()?;
        loop {
            let op = match self.peek().kind.clone() {
                LAngle => Op::Lt,
                LAngleEqual => Op::Le,
                RAngle => Op::Gt,
                RAngleEqual => Op::Ge,
                _ => return Ok(lhs),
            };
            self.next();
            let rhs = self.parse_add_expr()?;
            lhs = self.binop(op, lhs, rhs);
        }
    }

    /// add-expr = mul-expr { ( "+" | "-" ) mul-expr }
    fn parse_add_expr(&mut self) -> Result<Expr, Error> {
        let mut lhs = self.parse_mul_expr()?;
        loop {
            let op = match self.peek().kind.clone() {
                Plus => Op::Add,
                Minus => Op::Sub,
                _ => return Ok(lhs),
            };
            self.next();
            let rhs = self.parse_mul_expr()?;
            lhs = self.binop(op, lhs, rhs);
        }
    }

    /// mul-expr = unary-expr { ( "*" | "/" | "%" ) unary-expr }
    fn parse_mul_expr(&mut self) -> Result<Expr, Error> {
        let mut lhs = self.parse_unary_expr()?;
        loop {
            let op = match self.peek().kind.clone() {
                Star => Op::Mul,
                Slash => Op::Div,
                Percent => Op::Mod,
                _ => return Ok(lhs),
            };
            self.next();
            let rhs = self.parse_unary_expr()?;
            lhs = self.binop(op, lhs, rhs);
        }
    }

    /// unary-expr = "-" unary-expr
    ///            | "*" unary-expr
    ///            | "sizeof" "(" type ")"
    ///            | "(" type ")" unary-expr
    ///            | postfix-expr
    fn parse_unary_expr(&mut self) -> Result<Expr, Error> {
        let pos = self.peek().pos;
        match self.peek().kind.clone() {
            // Negation: 0 - unary-expr
            Minus => {
                self.next();
                let operand = self.parse_unary_expr()?;
                let zero = self.expr(ExprKind::IntLiteral(0), pos);
                let kind = ExprKind::BinOp(Op::Sub, Box::new(zero), Box::new(operand));
                Ok(self.expr(kind, pos))
            }

            // Dereference: "*" unary-expr
            Star => {
                self.next();
                let operand = self.parse_unary_expr()?;
                Ok(self.expr(ExprKind::ValueAt(Box::new(operand)), pos))
            }

            // Size of type: "sizeof" "(" type ")"
            KwSizeof => {
                self.next();
                expect!(self, LParen)?;
                let ty = self.parse_type()?;
                expect!(self, RParen)?;
                Ok(self.expr(ExprKind::SizeOf(ty), pos))
            }

            // Type cast: "(" type ")" unary-expr
            LParen if self.lookahead(1).kind.is_type_start() => {
                self.next();
                let ty = self.parse_type()?;
                expect!(self, RParen)?;
                let operand = self.parse_unary_expr()?;
                Ok(self.expr(ExprKind::TypeCast(ty, Box::new(operand)), pos))
            }

            _ => self.parse_postfix_expr(),
        }
    }

    /// postfix-expr = prim-expr { "." ident | "[" expr "]" }
    fn parse_postfix_expr(&mut self) -> Result<Expr, Error> {
        let mut expr = self.parse_prim_expr()?;
        loop {
            let pos = expr.pos;

            // Member access: expr "." ident
            if optional!(self, Period).is_some() {
                let (field, _) = self.parse_ident()?;
                expr = self.expr(ExprKind::FieldAccess(Box::new(expr), field), pos);
                continue;
            }

            // Array indexing: expr "[" expr "]"
            if optional!(self, LBracket).is_some() {
                let index = self.parse_expr()?;
                expect!(self, RBracket)?;
                expr = self.expr(ExprKind::ArrayAccess(Box::new(expr), Box::new(index)), pos);
                continue;
            }

            return Ok(expr);
        }
    }

    /// prim-expr = "(" expr ")" | ident [ "(" [ expr { "," expr } ] ")" ] | number | char | string
    fn parse_prim_expr(&mut self) -> Result<Expr, Error> {
        let pos = self.peek().pos;
        match self.peek().kind.clone() {
            // Grouping: "(" expr ")"
            LParen => {
                self.next();
                let expr = self.parse_expr()?;
                expect!(self, RParen)?;
                Ok(expr)
            }

            // Variable or function call
            Ident(name) => {
                self.next();
                if optional!(self, LParen).is_some() {
                    let args = repeat!(self, self.parse_expr(), Comma, RParen);
                    expect!(self, RParen)?;
                    Ok(self.expr(ExprKind::FunCall(name, args), pos))
                } else {
                    Ok(self.expr(ExprKind::Var(name), pos))
                }
            }

            Number(lexeme, value) => {
                self.next();
                let value = match i32::try_from(value) {
                    Ok(value) => value,
                    Err(_) => {
                        self.report(pos, Error::IntegerOverflow(lexeme));
                        0
                    }
                };
                Ok(self.expr(ExprKind::IntLiteral(value), pos))
            }

            Char(ch) => {
                self.next();
                Ok(self.expr(ExprKind::ChrLiteral(ch), pos))
            }

            Text(text) => {
                self.next();
                Ok(self.expr(ExprKind::StrLiteral(text), pos))
            }

            _ => Err(self.unexpected("expression")),
        }
    }
}
