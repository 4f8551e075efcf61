use sqlx::PgPool;
use tracing::info;

/// Idempotent DDL, applied in order on every start
const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id          BIGSERIAL PRIMARY KEY,
        name        VARCHAR(50)  NOT NULL,
        username    VARCHAR(50)  NOT NULL,
        email       VARCHAR(255) NOT NULL,
        password    TEXT         NOT NULL,
        occupation  TEXT         NOT NULL DEFAULT '',
        about       TEXT         NOT NULL DEFAULT '',
        created_at  TIMESTAMPTZ  NOT NULL DEFAULT now(),
        updated_at  TIMESTAMPTZ  NOT NULL DEFAULT now(),
        deleted_at  TIMESTAMPTZ
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_users_username ON users (username)",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_users_email ON users (email)",
    "CREATE INDEX IF NOT EXISTS idx_users_deleted_at ON users (deleted_at)",
    r#"
    CREATE TABLE IF NOT EXISTS task_lists (
        id          BIGSERIAL PRIMARY KEY,
        user_id     BIGINT      NOT NULL REFERENCES users (id),
        name        TEXT        NOT NULL,
        created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
        deleted_at  TIMESTAMPTZ
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_task_lists_user_id ON task_lists (user_id)",
    "CREATE INDEX IF NOT EXISTS idx_task_lists_deleted_at ON task_lists (deleted_at)",
    r#"
    CREATE TABLE IF NOT EXISTS tasks (
        id            BIGSERIAL PRIMARY KEY,
        task_list_id  BIGINT      NOT NULL REFERENCES task_lists (id),
        text          TEXT        NOT NULL,
        completed     BOOLEAN     NOT NULL DEFAULT FALSE,
        created_at    TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at    TIMESTAMPTZ NOT NULL DEFAULT now(),
        deleted_at    TIMESTAMPTZ
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_tasks_task_list_id ON tasks (task_list_id)",
    "CREATE INDEX IF NOT EXISTS idx_tasks_deleted_at ON tasks (deleted_at)",
    r#"
    CREATE TABLE IF NOT EXISTS goals (
        id           BIGSERIAL PRIMARY KEY,
        user_id      BIGINT       NOT NULL REFERENCES users (id),
        name         VARCHAR(255) NOT NULL,
        deadline     TIMESTAMPTZ  NOT NULL,
        description  TEXT         NOT NULL DEFAULT '',
        what         TEXT         NOT NULL DEFAULT '',
        how_much     TEXT         NOT NULL DEFAULT '',
        resources    TEXT         NOT NULL DEFAULT '',
        alignment    TEXT         NOT NULL DEFAULT '',
        completed    BOOLEAN      NOT NULL DEFAULT FALSE,
        created_at   TIMESTAMPTZ  NOT NULL DEFAULT now(),
        updated_at   TIMESTAMPTZ  NOT NULL DEFAULT now(),
        deleted_at   TIMESTAMPTZ
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_goals_user_id ON goals (user_id)",
    "CREATE INDEX IF NOT EXISTS idx_goals_deleted_at ON goals (deleted_at)",
    r#"
    CREATE TABLE IF NOT EXISTS subgoals (
        id          BIGSERIAL PRIMARY KEY,
        goal_id     BIGINT       NOT NULL REFERENCES goals (id),
        name        VARCHAR(255) NOT NULL,
        completed   BOOLEAN      NOT NULL DEFAULT FALSE,
        created_at  TIMESTAMPTZ  NOT NULL DEFAULT now(),
        updated_at  TIMESTAMPTZ  NOT NULL DEFAULT now(),
        deleted_at  TIMESTAMPTZ
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_subgoals_goal_id ON subgoals (goal_id)",
    r#"
    CREATE TABLE IF NOT EXISTS habits (
        id          BIGSERIAL PRIMARY KEY,
        goal_id     BIGINT       NOT NULL REFERENCES goals (id),
        name        VARCHAR(255) NOT NULL,
        frequency   TEXT         NOT NULL DEFAULT '',
        created_at  TIMESTAMPTZ  NOT NULL DEFAULT now(),
        updated_at  TIMESTAMPTZ  NOT NULL DEFAULT now(),
        deleted_at  TIMESTAMPTZ
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_habits_goal_id ON habits (goal_id)",
];

/// Create every table and index that does not exist yet
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::Error> {
    for statement in MIGRATIONS {
        sqlx::query(statement).execute(pool).await?;
    }
    info!("Database migrated ({} statements)", MIGRATIONS.len());
    Ok(())
}
