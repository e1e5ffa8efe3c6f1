use std::collections::HashSet;

use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, Statement, TransactionTrait};
use shelf_kernel::Migration;

use crate::DbError;

const LEDGER_TABLE: &str = "_shelf_migrations";

/// Apply every migration not yet recorded in the ledger table.
///
/// Each migration runs in its own transaction together with its ledger row.
/// Returns the number of migrations applied by this call.
pub async fn run_migrations(
    db: &DatabaseConnection,
    migrations: &[(String, Migration)],
) -> Result<usize, DbError> {
    let backend = db.get_database_backend();

    db.execute_unprepared(&format!(
        "CREATE TABLE IF NOT EXISTS {LEDGER_TABLE} (
            module     TEXT NOT NULL,
            id         TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (module, id)
        )"
    ))
    .await?;

    let applied: HashSet<(String, String)> = db
        .query_all(Statement::from_string(
            backend,
            format!("SELECT module, id FROM {LEDGER_TABLE}"),
        ))
        .await?
        .into_iter()
        .map(|row| Ok((row.try_get("", "module")?, row.try_get("", "id")?)))
        .collect::<Result<_, DbErr>>()?;

    let mut count = 0;
    for (module, migration) in migrations {
        if applied.contains(&(module.clone(), migration.id.to_string())) {
            tracing::debug!(module = %module, id = migration.id, "migration already applied");
            continue;
        }

        let wrap = |source: DbErr| DbError::Migration {
            module: module.clone(),
            id: migration.id.to_string(),
            source,
        };

        let txn = db.begin().await.map_err(wrap)?;
        for statement in split_statements(migration.up) {
            txn.execute_unprepared(statement).await.map_err(wrap)?;
        }
        txn.execute(Statement::from_sql_and_values(
            backend,
            format!("INSERT INTO {LEDGER_TABLE} (module, id) VALUES (?, ?)"),
            [module.clone().into(), migration.id.into()],
        ))
        .await
        .map_err(wrap)?;
        txn.commit().await.map_err(wrap)?;

        tracing::info!(module = %module, id = migration.id, "applied migration");
        count += 1;
    }

    Ok(count)
}

fn split_statements(sql: &str) -> impl Iterator<Item = &str> {
    sql.split(';').map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelf_kernel::settings::DatabaseSettings;

    async fn memory_db() -> DatabaseConnection {
        crate::connect(&DatabaseSettings {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
        })
        .await
        .unwrap()
    }

    fn migrations() -> Vec<(String, Migration)> {
        vec![
            (
                "books".to_string(),
                Migration {
                    id: "001_init",
                    up: r#"
                        CREATE TABLE shelf (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
                        CREATE INDEX shelf_name ON shelf (name);
                    "#,
                },
            ),
            (
                "books".to_string(),
                Migration {
                    id: "002_seed",
                    up: "INSERT INTO shelf (name) VALUES ('first');",
                },
            ),
        ]
    }

    #[test]
    fn statements_are_split_and_trimmed() {
        let parts: Vec<&str> = split_statements(" A; B ;\n ; C").collect();
        assert_eq!(parts, vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn migrations_apply_once() {
        let db = memory_db().await;

        assert_eq!(run_migrations(&db, &migrations()).await.unwrap(), 2);
        assert_eq!(run_migrations(&db, &migrations()).await.unwrap(), 0);

        let rows = db
            .query_all(Statement::from_string(
                db.get_database_backend(),
                "SELECT name FROM shelf".to_string(),
            ))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn failing_migration_reports_module_and_id() {
        let db = memory_db().await;
        let broken = vec![(
            "reviews".to_string(),
            Migration {
                id: "001_init",
                up: "CREATE TABLE oops (",
            },
        )];

        let err = run_migrations(&db, &broken).await.unwrap_err();
        match err {
            DbError::Migration { module, id, .. } => {
                assert_eq!(module, "reviews");
                assert_eq!(id, "001_init");
            }
            other => panic!("expected migration error, got {other:?}"),
        }
    }
}
