use crate::core::{OrmError, Result, Value};
use crate::dialect::Dialect;
use crate::parser::ast::*;
use sqlparser::ast as sql_ast;
use sqlparser::dialect::{GenericDialect, MySqlDialect, PostgreSqlDialect, SQLiteDialect};
use sqlparser::parser::Parser;

/// Turns one parameterized SQL statement into the executor's AST.
///
/// `CREATE TABLE` is parsed with the target dialect so engine-specific syntax
/// (`AUTO_INCREMENT`, `BIGSERIAL`, table options) is accepted; everything else
/// goes through the generic dialect, which reads `?` as a positional placeholder.
pub struct SqlParserAdapter {
    dialect: Dialect,
}

impl SqlParserAdapter {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    pub fn parse(&self, sql: &str, params: &[Value]) -> Result<Statement> {
        let mut statements = self.parse_raw(sql)?;
        if statements.len() != 1 {
            return Err(parse_error(format!(
                "expected exactly one statement, found {}",
                statements.len()
            )));
        }

        let mut binder = ParamBinder::new(params);
        let statement = self.convert_statement(statements.remove(0), &mut binder)?;
        binder.finish()?;
        Ok(statement)
    }

    fn parse_raw(&self, sql: &str) -> Result<Vec<sql_ast::Statement>> {
        let is_ddl = sql
            .trim_start()
            .get(..6)
            .is_some_and(|head| head.eq_ignore_ascii_case("CREATE"));

        let parsed = if is_ddl {
            match self.dialect {
                Dialect::MySql | Dialect::MariaDb => Parser::parse_sql(&MySqlDialect {}, sql),
                Dialect::PostgreSql => Parser::parse_sql(&PostgreSqlDialect {}, sql),
                Dialect::Sqlite => Parser::parse_sql(&SQLiteDialect {}, sql),
            }
        } else {
            Parser::parse_sql(&GenericDialect {}, sql)
        };

        parsed.map_err(|e| parse_error(e.to_string()))
    }

    fn convert_statement(
        &self,
        stmt: sql_ast::Statement,
        binder: &mut ParamBinder<'_>,
    ) -> Result<Statement> {
        match stmt {
            sql_ast::Statement::CreateTable(create) => {
                Ok(Statement::CreateTable(self.convert_create_table(create)?))
            }
            sql_ast::Statement::Insert(insert) => {
                Ok(Statement::Insert(self.convert_insert(insert, binder)?))
            }
            sql_ast::Statement::Query(query) => {
                Ok(Statement::Query(self.convert_query(*query, binder)?))
            }
            sql_ast::Statement::Delete(delete) => {
                Ok(Statement::Delete(self.convert_delete(delete, binder)?))
            }
            sql_ast::Statement::Update { table, assignments, selection, .. } => {
                Ok(Statement::Update(self.convert_update(table, assignments, selection, binder)?))
            }
            other => Err(unsupported(format!("Statement type not supported: {}", other))),
        }
    }

    fn convert_create_table(&self, create: sql_ast::CreateTable) -> Result<CreateTableStmt> {
        let table_name = extract_table_name(&create.name)?;

        let table_primary_key: Vec<String> = create
            .constraints
            .iter()
            .filter_map(|constraint| primary_key_columns(&constraint.to_string()))
            .flatten()
            .collect();

        let columns = create
            .columns
            .into_iter()
            .map(|col| {
                let inline_primary_key = col.options.iter().any(|opt| {
                    opt.option
                        .to_string()
                        .to_ascii_uppercase()
                        .starts_with("PRIMARY KEY")
                });
                let not_null = col
                    .options
                    .iter()
                    .any(|opt| matches!(opt.option, sql_ast::ColumnOption::NotNull));
                let name = col.name.value;
                let primary_key = inline_primary_key
                    || table_primary_key.iter().any(|pk| pk.eq_ignore_ascii_case(&name));

                ColumnDef {
                    data_type: DataType::from_sql(&col.data_type.to_string()),
                    nullable: !(not_null || primary_key),
                    primary_key,
                    name,
                }
            })
            .collect::<Vec<_>>();

        if columns.is_empty() {
            return Err(parse_error(format!("table {} declares no columns", table_name)));
        }

        Ok(CreateTableStmt {
            table_name,
            columns,
            if_not_exists: create.if_not_exists,
        })
    }

    fn convert_insert(
        &self,
        insert: sql_ast::Insert,
        binder: &mut ParamBinder<'_>,
    ) -> Result<InsertStmt> {
        let table_name = trim_identifier(&insert.table.to_string());

        let columns = if insert.columns.is_empty() {
            None
        } else {
            Some(insert.columns.into_iter().map(|id| id.value).collect())
        };

        let Some(source) = insert.source else {
            return Err(unsupported("INSERT requires a VALUES clause".to_string()));
        };
        let sql_ast::SetExpr::Values(vals) = *source.body else {
            return Err(unsupported("Only VALUES clause supported".to_string()));
        };

        let values = vals
            .rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|expr| convert_scalar(expr, binder))
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(InsertStmt {
            table_name,
            columns,
            values,
        })
    }

    fn convert_query(
        &self,
        query: sql_ast::Query,
        binder: &mut ParamBinder<'_>,
    ) -> Result<QueryStmt> {
        let sql_ast::SetExpr::Select(select) = *query.body else {
            return Err(unsupported("Only SELECT queries supported".to_string()));
        };

        let mut wildcard = false;
        let mut columns = Vec::new();
        for item in select.projection {
            match item {
                sql_ast::SelectItem::Wildcard(_) => wildcard = true,
                sql_ast::SelectItem::UnnamedExpr(expr) => match column_name(&expr) {
                    Some(name) => columns.push(name),
                    None => {
                        return Err(unsupported(format!("Unsupported select item: {}", expr)));
                    }
                },
                other => return Err(unsupported(format!("Unsupported select item: {}", other))),
            }
        }
        let projection = if wildcard {
            Projection::Wildcard
        } else {
            Projection::Columns(columns)
        };

        if select.from.len() != 1 || !select.from[0].joins.is_empty() {
            return Err(unsupported("SELECT must read from exactly one table".to_string()));
        }
        let table_name = match &select.from[0].relation {
            sql_ast::TableFactor::Table { name, .. } => extract_table_name(name)?,
            _ => {
                return Err(unsupported(
                    "Complex table references not supported".to_string(),
                ));
            }
        };

        let selection = convert_selection(select.selection, binder)?;

        Ok(QueryStmt {
            table_name,
            projection,
            selection,
        })
    }

    fn convert_delete(
        &self,
        delete: sql_ast::Delete,
        binder: &mut ParamBinder<'_>,
    ) -> Result<DeleteStmt> {
        let tables = match delete.from {
            sql_ast::FromTable::WithFromKeyword(tables) => tables,
            sql_ast::FromTable::WithoutKeyword(tables) => tables,
        };
        let Some(table) = tables.first() else {
            return Err(parse_error("DELETE requires table name".to_string()));
        };
        let table_name = match &table.relation {
            sql_ast::TableFactor::Table { name, .. } => extract_table_name(name)?,
            _ => {
                return Err(unsupported(
                    "Complex table references not supported in DELETE".to_string(),
                ));
            }
        };

        let selection = convert_selection(delete.selection, binder)?;

        Ok(DeleteStmt {
            table_name,
            selection,
        })
    }

    fn convert_update(
        &self,
        table: sql_ast::TableWithJoins,
        assignments: Vec<sql_ast::Assignment>,
        selection: Option<sql_ast::Expr>,
        binder: &mut ParamBinder<'_>,
    ) -> Result<UpdateStmt> {
        let table_name = match table.relation {
            sql_ast::TableFactor::Table { name, .. } => extract_table_name(&name)?,
            _ => {
                return Err(unsupported(
                    "Complex table references not supported in UPDATE".to_string(),
                ));
            }
        };

        // SET placeholders precede WHERE placeholders in the statement text.
        let assignments = assignments
            .into_iter()
            .map(|assign| {
                let column = match assign.target {
                    sql_ast::AssignmentTarget::ColumnName(col_name) => {
                        if col_name.0.len() == 1 {
                            trim_identifier(&col_name.0[0].to_string())
                        } else {
                            return Err(unsupported(
                                "Qualified column names not supported in UPDATE".to_string(),
                            ));
                        }
                    }
                    _ => {
                        return Err(unsupported(
                            "Only simple column names supported in UPDATE".to_string(),
                        ));
                    }
                };

                let value = convert_scalar(assign.value, binder)?;
                Ok(Assignment { column, value })
            })
            .collect::<Result<Vec<_>>>()?;

        let selection = convert_selection(selection, binder)?;

        Ok(UpdateStmt {
            table_name,
            assignments,
            selection,
        })
    }
}

/// Hands out bound parameters in placeholder order.
struct ParamBinder<'a> {
    params: &'a [Value],
    next: usize,
}

impl<'a> ParamBinder<'a> {
    fn new(params: &'a [Value]) -> Self {
        Self { params, next: 0 }
    }

    fn bind(&mut self) -> Result<Value> {
        let value = self.params.get(self.next).cloned().ok_or_else(|| {
            parse_error(format!(
                "statement has more placeholders than the {} bound parameter(s)",
                self.params.len()
            ))
        })?;
        self.next += 1;
        Ok(value)
    }

    fn finish(&self) -> Result<()> {
        if self.next != self.params.len() {
            return Err(parse_error(format!(
                "{} parameter(s) bound but the statement uses {}",
                self.params.len(),
                self.next
            )));
        }
        Ok(())
    }
}

fn convert_selection(
    selection: Option<sql_ast::Expr>,
    binder: &mut ParamBinder<'_>,
) -> Result<Vec<Condition>> {
    let mut conditions = Vec::new();
    if let Some(expr) = selection {
        collect_conditions(expr, binder, &mut conditions)?;
    }
    Ok(conditions)
}

fn collect_conditions(
    expr: sql_ast::Expr,
    binder: &mut ParamBinder<'_>,
    conditions: &mut Vec<Condition>,
) -> Result<()> {
    match expr {
        sql_ast::Expr::Nested(inner) => collect_conditions(*inner, binder, conditions),
        sql_ast::Expr::BinaryOp { left, op: sql_ast::BinaryOperator::And, right } => {
            collect_conditions(*left, binder, conditions)?;
            collect_conditions(*right, binder, conditions)
        }
        sql_ast::Expr::BinaryOp { left, op: sql_ast::BinaryOperator::Eq, right } => {
            let condition = match (column_name(&left), column_name(&right)) {
                (Some(column), _) => Condition {
                    column,
                    value: convert_scalar(*right, binder)?,
                },
                (None, Some(column)) => Condition {
                    value: convert_scalar(*left, binder)?,
                    column,
                },
                (None, None) => {
                    return Err(unsupported(format!(
                        "Equality needs a column operand: {} = {}",
                        left, right
                    )));
                }
            };
            conditions.push(condition);
            Ok(())
        }
        other => Err(unsupported(format!(
            "Only `column = value` conditions joined by AND are supported, got: {}",
            other
        ))),
    }
}

fn column_name(expr: &sql_ast::Expr) -> Option<String> {
    match expr {
        sql_ast::Expr::Identifier(ident) => Some(ident.value.clone()),
        sql_ast::Expr::CompoundIdentifier(idents) => idents.last().map(|ident| ident.value.clone()),
        _ => None,
    }
}

fn convert_scalar(expr: sql_ast::Expr, binder: &mut ParamBinder<'_>) -> Result<Value> {
    match expr {
        sql_ast::Expr::Value(value_with_span) => convert_value(&value_with_span.value, binder),
        sql_ast::Expr::Nested(inner) => convert_scalar(*inner, binder),
        sql_ast::Expr::UnaryOp { op: sql_ast::UnaryOperator::Minus, expr } => {
            match convert_scalar(*expr, binder)? {
                Value::Integer(i) => Ok(Value::Integer(-i)),
                Value::Float(f) => Ok(Value::Float(-f)),
                other => Err(parse_error(format!("Cannot negate {}", other.type_name()))),
            }
        }
        other => Err(unsupported(format!("Unsupported value expression: {}", other))),
    }
}

fn convert_value(val: &sql_ast::Value, binder: &mut ParamBinder<'_>) -> Result<Value> {
    match val {
        sql_ast::Value::Placeholder(_) => binder.bind(),
        sql_ast::Value::Number(n, _) => {
            if let Ok(i) = n.parse::<i64>() {
                Ok(Value::Integer(i))
            } else if let Ok(f) = n.parse::<f64>() {
                Ok(Value::Float(f))
            } else {
                Err(parse_error(format!("Invalid number: {}", n)))
            }
        }
        sql_ast::Value::SingleQuotedString(s) | sql_ast::Value::DoubleQuotedString(s) => {
            Ok(Value::Text(s.clone()))
        }
        sql_ast::Value::Boolean(b) => Ok(Value::Boolean(*b)),
        sql_ast::Value::Null => Ok(Value::Null),
        _ => Err(unsupported(format!("Unsupported value: {}", val))),
    }
}

/// Column list of a rendered `PRIMARY KEY (a, b)` table constraint.
fn primary_key_columns(constraint: &str) -> Option<Vec<String>> {
    let upper = constraint.to_ascii_uppercase();
    let start = upper.find("PRIMARY KEY")?;
    let rest = &constraint[start..];
    let open = rest.find('(')?;
    let close = rest[open..].find(')')? + open;
    Some(
        rest[open + 1..close]
            .split(',')
            .map(trim_identifier)
            .filter(|name| !name.is_empty())
            .collect(),
    )
}

fn extract_table_name(name: &sql_ast::ObjectName) -> Result<String> {
    name.0
        .last()
        .map(|ident| trim_identifier(&ident.to_string()))
        .ok_or_else(|| parse_error("Invalid table name".to_string()))
}

fn trim_identifier(value: &str) -> String {
    value
        .trim()
        .trim_matches('"')
        .trim_matches('`')
        .trim_matches('[')
        .trim_matches(']')
        .to_string()
}

fn parse_error(msg: String) -> OrmError {
    OrmError::ExecutionError(format!("Parse error: {}", msg))
}

fn unsupported(msg: String) -> OrmError {
    OrmError::ExecutionError(format!("Unsupported operation: {}", msg))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(dialect: Dialect, sql: &str, params: &[Value]) -> Statement {
        SqlParserAdapter::new(dialect).parse(sql, params).unwrap()
    }

    #[test]
    fn test_parse_mysql_create_table() {
        let sql = "CREATE TABLE IF NOT EXISTS users (\n  id BIGINT AUTO_INCREMENT NOT NULL,\n  \
                   name VARCHAR(64) NOT NULL,\n  active BOOLEAN,\n  PRIMARY KEY (id)\n\
                   ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4;";
        let Statement::CreateTable(create) = parse(Dialect::MySql, sql, &[]) else {
            panic!("Expected CreateTable");
        };

        assert_eq!(create.table_name, "users");
        assert!(create.if_not_exists);
        assert_eq!(create.columns.len(), 3);
        assert!(create.columns[0].primary_key);
        assert_eq!(create.columns[0].data_type, DataType::Integer);
        assert_eq!(create.columns[1].data_type, DataType::Text);
        assert!(!create.columns[1].nullable);
        assert_eq!(create.columns[2].data_type, DataType::Boolean);
        assert!(create.columns[2].nullable);
    }

    #[test]
    fn test_parse_postgres_serial() {
        let sql = "CREATE TABLE IF NOT EXISTS t (\n  id BIGSERIAL NOT NULL,\n  \
                   ratio DOUBLE PRECISION,\n  PRIMARY KEY (id)\n) ;";
        let Statement::CreateTable(create) = parse(Dialect::PostgreSql, sql, &[]) else {
            panic!("Expected CreateTable");
        };

        assert_eq!(create.columns[0].data_type, DataType::Integer);
        assert!(create.columns[0].primary_key);
        assert_eq!(create.columns[1].data_type, DataType::Float);
    }

    #[test]
    fn test_bind_insert_parameters() {
        let stmt = parse(
            Dialect::Sqlite,
            "INSERT INTO users (id,name) VALUES (?,?)",
            &[Value::Null, Value::Text("a".into())],
        );
        let Statement::Insert(insert) = stmt else {
            panic!("Expected Insert");
        };

        assert_eq!(insert.table_name, "users");
        assert_eq!(insert.columns, Some(vec!["id".to_string(), "name".to_string()]));
        assert_eq!(insert.values, vec![vec![Value::Null, Value::Text("a".into())]]);
    }

    #[test]
    fn test_select_with_condition() {
        let stmt = parse(
            Dialect::PostgreSql,
            "SELECT * FROM users WHERE id = ? AND name = 'x'",
            &[Value::Integer(4)],
        );
        let Statement::Query(query) = stmt else {
            panic!("Expected Query");
        };

        assert_eq!(query.projection, Projection::Wildcard);
        assert_eq!(
            query.selection,
            vec![
                Condition { column: "id".into(), value: Value::Integer(4) },
                Condition { column: "name".into(), value: Value::Text("x".into()) },
            ]
        );
    }

    #[test]
    fn test_update_binds_set_before_where() {
        let stmt = parse(
            Dialect::MySql,
            "UPDATE users SET name = ? WHERE id = ?",
            &[Value::Text("b".into()), Value::Integer(1)],
        );
        let Statement::Update(update) = stmt else {
            panic!("Expected Update");
        };

        assert_eq!(update.assignments[0].value, Value::Text("b".into()));
        assert_eq!(update.selection[0].value, Value::Integer(1));
    }

    #[test]
    fn test_parameter_count_mismatch() {
        let adapter = SqlParserAdapter::new(Dialect::Sqlite);
        assert!(adapter.parse("DELETE FROM users WHERE id = ?", &[]).is_err());
        assert!(
            adapter
                .parse("DELETE FROM users", &[Value::Integer(1)])
                .unwrap_err()
                .is_execution()
        );
    }

    #[test]
    fn test_syntax_error_is_execution_error() {
        let err = SqlParserAdapter::new(Dialect::MySql)
            .parse("SELEC * FROM", &[])
            .unwrap_err();
        assert!(err.is_execution());
    }

    #[test]
    fn test_primary_key_constraint_columns() {
        assert_eq!(primary_key_columns("PRIMARY KEY (id)"), Some(vec!["id".to_string()]));
        assert_eq!(
            primary_key_columns("CONSTRAINT pk PRIMARY KEY (\"a\", b)"),
            Some(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(primary_key_columns("UNIQUE (email)"), None);
    }
}
