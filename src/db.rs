use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};

use crate::models::{Board, BoardDetail, Card, List};

/// The four lists every new board starts with, at positions 1..4.
pub const DEFAULT_LISTS: [&str; 4] = ["Backlog", "To Do", "In Progress", "Done"];

/// Async-safe handle to the board database.
///
/// Wraps `BoardDb` behind `Arc<Mutex>` and runs all access on tokio's
/// blocking thread pool via `spawn_blocking`, preventing synchronous
/// SQLite I/O from tying up async worker threads.
#[derive(Clone)]
pub struct DbHandle {
    inner: Arc<std::sync::Mutex<BoardDb>>,
}

impl DbHandle {
    pub fn new(db: BoardDb) -> Self {
        Self {
            inner: Arc::new(std::sync::Mutex::new(db)),
        }
    }

    /// Run a closure with access to the database on a blocking thread.
    /// All data passed into `f` must be owned (`'static`).
    pub async fn call<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&BoardDb) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let db = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let guard = db
                .lock()
                .map_err(|e| anyhow::anyhow!("DB lock poisoned: {}", e))?;
            f(&guard)
        })
        .await
        .context("DB task panicked")?
    }
}

pub struct BoardDb {
    conn: Connection,
}

impl BoardDb {
    /// Open (or create) a SQLite database at the given path and run migrations.
    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).context("Failed to open SQLite database")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Create an in-memory SQLite database (for testing).
    pub fn new_in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().context("Failed to open in-memory SQLite database")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    fn init(&self) -> Result<()> {
        self.conn
            .execute_batch("PRAGMA foreign_keys = ON;")
            .context("Failed to enable foreign keys")?;
        self.run_migrations().context("Failed to run migrations")?;
        Ok(())
    }

    fn run_migrations(&self) -> Result<()> {
        // Referential integrity is declared, but the delete cascade is
        // an explicit ordered transaction (see delete_board), not an
        // ON DELETE clause.
        self.conn
            .execute_batch(
                "
                CREATE TABLE IF NOT EXISTS boards (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS lists (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    board_id INTEGER NOT NULL REFERENCES boards(id),
                    name TEXT NOT NULL,
                    position INTEGER NOT NULL
                );

                CREATE TABLE IF NOT EXISTS cards (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    list_id INTEGER NOT NULL REFERENCES lists(id),
                    title TEXT NOT NULL,
                    description TEXT NOT NULL DEFAULT '',
                    position INTEGER NOT NULL,
                    color TEXT
                );

                CREATE INDEX IF NOT EXISTS idx_lists_board ON lists(board_id, position);
                CREATE INDEX IF NOT EXISTS idx_cards_list ON cards(list_id, position);
                ",
            )
            .context("Failed to create tables")?;
        Ok(())
    }

    // ── Board CRUD ────────────────────────────────────────────────────

    pub fn list_boards(&self) -> Result<Vec<Board>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM boards ORDER BY id")
            .context("Failed to prepare list_boards")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Board {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })
            .context("Failed to query boards")?;
        let mut boards = Vec::new();
        for row in rows {
            boards.push(row.context("Failed to read board row")?);
        }
        Ok(boards)
    }

    pub fn get_board(&self, id: i64) -> Result<Option<Board>> {
        self.conn
            .query_row(
                "SELECT id, name FROM boards WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Board {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()
            .context("Failed to query board")
    }

    /// Board with its lists ordered by position, each list populated
    /// with its cards ordered by position. Short-circuits to `None`
    /// before touching the lists when the board does not exist.
    pub fn get_board_detail(&self, id: i64) -> Result<Option<BoardDetail>> {
        let board = match self.get_board(id)? {
            Some(b) => b,
            None => return Ok(None),
        };

        let mut lists = self.lists_for_board(id)?;
        for list in &mut lists {
            list.cards = self.cards_for_list(list.id)?;
        }

        Ok(Some(BoardDetail { board, lists }))
    }

    /// Insert the board row plus the four default lists at positions
    /// 1..4 in a single transaction; all five inserts succeed or none
    /// do. Returns the rows actually inserted, real ids included.
    pub fn create_board(&self, name: &str) -> Result<BoardDetail> {
        // Safety: DbHandle's Mutex already guarantees single-threaded access.
        let tx = self
            .conn
            .unchecked_transaction()
            .context("Failed to begin transaction")?;

        tx.execute("INSERT INTO boards (name) VALUES (?1)", params![name])
            .context("Failed to insert board")?;
        let board_id = tx.last_insert_rowid();

        let mut lists = Vec::with_capacity(DEFAULT_LISTS.len());
        for (i, list_name) in DEFAULT_LISTS.iter().enumerate() {
            let position = i as i32 + 1;
            tx.execute(
                "INSERT INTO lists (board_id, name, position) VALUES (?1, ?2, ?3)",
                params![board_id, list_name, position],
            )
            .context("Failed to insert default list")?;
            lists.push(List {
                id: tx.last_insert_rowid(),
                board_id,
                name: (*list_name).to_string(),
                position,
                cards: Vec::new(),
            });
        }

        tx.commit().context("Failed to commit board creation")?;

        Ok(BoardDetail {
            board: Board {
                id: board_id,
                name: name.to_string(),
            },
            lists,
        })
    }

    pub fn update_board(&self, id: i64, name: &str) -> Result<Option<Board>> {
        let count = self
            .conn
            .execute(
                "UPDATE boards SET name = ?1 WHERE id = ?2",
                params![name, id],
            )
            .context("Failed to update board")?;
        if count == 0 {
            return Ok(None);
        }
        self.get_board(id)
    }

    /// Manual ordered cascade in one transaction: cards belonging to
    /// the board's lists, then the lists, then the board row itself.
    /// Partial failure rolls back entirely.
    pub fn delete_board(&self, id: i64) -> Result<Option<Board>> {
        let board = match self.get_board(id)? {
            Some(b) => b,
            None => return Ok(None),
        };

        let tx = self
            .conn
            .unchecked_transaction()
            .context("Failed to begin transaction")?;

        tx.execute(
            "DELETE FROM cards WHERE list_id IN (SELECT id FROM lists WHERE board_id = ?1)",
            params![id],
        )
        .context("Failed to delete board cards")?;
        tx.execute("DELETE FROM lists WHERE board_id = ?1", params![id])
            .context("Failed to delete board lists")?;
        tx.execute("DELETE FROM boards WHERE id = ?1", params![id])
            .context("Failed to delete board")?;

        tx.commit().context("Failed to commit board deletion")?;
        Ok(Some(board))
    }

    // ── Card CRUD ─────────────────────────────────────────────────────

    /// Appends to the end of the list: the position lookup and the
    /// insert share one transaction so the max+1 computation cannot be
    /// split from the write.
    pub fn create_card(
        &self,
        list_id: i64,
        title: &str,
        description: &str,
        color: Option<&str>,
    ) -> Result<Card> {
        let tx = self
            .conn
            .unchecked_transaction()
            .context("Failed to begin transaction")?;

        let position: i32 = tx
            .query_row(
                "SELECT COALESCE(MAX(position), 0) + 1 FROM cards WHERE list_id = ?1",
                params![list_id],
                |row| row.get(0),
            )
            .context("Failed to get next card position")?;

        tx.execute(
            "INSERT INTO cards (list_id, title, description, position, color)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![list_id, title, description, position, color],
        )
        .context("Failed to insert card")?;
        let id = tx.last_insert_rowid();

        tx.commit().context("Failed to commit card creation")?;
        self.get_card(id)?.context("Card not found after insert")
    }

    pub fn get_card(&self, id: i64) -> Result<Option<Card>> {
        self.conn
            .query_row(
                "SELECT id, list_id, title, description, position, color
                 FROM cards WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Card {
                        id: row.get(0)?,
                        list_id: row.get(1)?,
                        title: row.get(2)?,
                        description: row.get(3)?,
                        position: row.get(4)?,
                        color: row.get(5)?,
                    })
                },
            )
            .optional()
            .context("Failed to query card")
    }

    /// Title, description and color are always overwritten; list and
    /// position keep their prior values when `None`. Siblings are never
    /// renumbered.
    pub fn update_card(
        &self,
        id: i64,
        title: &str,
        description: &str,
        color: Option<&str>,
        list_id: Option<i64>,
        position: Option<i32>,
    ) -> Result<Option<Card>> {
        let count = self
            .conn
            .execute(
                "UPDATE cards SET title = ?1, description = ?2, color = ?3,
                     list_id = COALESCE(?4, list_id),
                     position = COALESCE(?5, position)
                 WHERE id = ?6",
                params![title, description, color, list_id, position, id],
            )
            .context("Failed to update card")?;
        if count == 0 {
            return Ok(None);
        }
        self.get_card(id)
    }

    pub fn delete_card(&self, id: i64) -> Result<Option<Card>> {
        let card = match self.get_card(id)? {
            Some(c) => c,
            None => return Ok(None),
        };
        self.conn
            .execute("DELETE FROM cards WHERE id = ?1", params![id])
            .context("Failed to delete card")?;
        Ok(Some(card))
    }

    // ── Row helpers ───────────────────────────────────────────────────

    fn lists_for_board(&self, board_id: i64) -> Result<Vec<List>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, board_id, name, position FROM lists
                 WHERE board_id = ?1 ORDER BY position",
            )
            .context("Failed to prepare lists_for_board")?;
        let rows = stmt
            .query_map(params![board_id], |row| {
                Ok(List {
                    id: row.get(0)?,
                    board_id: row.get(1)?,
                    name: row.get(2)?,
                    position: row.get(3)?,
                    cards: Vec::new(),
                })
            })
            .context("Failed to query lists")?;
        let mut lists = Vec::new();
        for row in rows {
            lists.push(row.context("Failed to read list row")?);
        }
        Ok(lists)
    }

    fn cards_for_list(&self, list_id: i64) -> Result<Vec<Card>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, list_id, title, description, position, color FROM cards
                 WHERE list_id = ?1 ORDER BY position",
            )
            .context("Failed to prepare cards_for_list")?;
        let rows = stmt
            .query_map(params![list_id], |row| {
                Ok(Card {
                    id: row.get(0)?,
                    list_id: row.get(1)?,
                    title: row.get(2)?,
                    description: row.get(3)?,
                    position: row.get(4)?,
                    color: row.get(5)?,
                })
            })
            .context("Failed to query cards")?;
        let mut cards = Vec::new();
        for row in rows {
            cards.push(row.context("Failed to read card row")?);
        }
        Ok(cards)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_board_seeds_default_lists() -> Result<()> {
        let db = BoardDb::new_in_memory()?;
        let detail = db.create_board("Sprint1")?;

        assert_eq!(detail.board.name, "Sprint1");
        let names: Vec<&str> = detail.lists.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["Backlog", "To Do", "In Progress", "Done"]);
        let positions: Vec<i32> = detail.lists.iter().map(|l| l.position).collect();
        assert_eq!(positions, vec![1, 2, 3, 4]);

        // Returned ids must be the rows actually inserted, not guesses.
        let fetched = db.get_board_detail(detail.board.id)?.unwrap();
        let fetched_ids: Vec<i64> = fetched.lists.iter().map(|l| l.id).collect();
        let returned_ids: Vec<i64> = detail.lists.iter().map(|l| l.id).collect();
        assert_eq!(returned_ids, fetched_ids);
        Ok(())
    }

    #[test]
    fn test_second_board_lists_get_fresh_ids() -> Result<()> {
        let db = BoardDb::new_in_memory()?;
        let first = db.create_board("One")?;
        let second = db.create_board("Two")?;

        let first_ids: Vec<i64> = first.lists.iter().map(|l| l.id).collect();
        assert_eq!(first_ids, vec![1, 2, 3, 4]);
        let second_ids: Vec<i64> = second.lists.iter().map(|l| l.id).collect();
        assert_eq!(second_ids, vec![5, 6, 7, 8]);
        Ok(())
    }

    #[test]
    fn test_card_positions_append_per_list() -> Result<()> {
        let db = BoardDb::new_in_memory()?;
        let detail = db.create_board("b")?;
        let backlog = detail.lists[0].id;
        let todo = detail.lists[1].id;

        let first = db.create_card(backlog, "Fix bug", "", None)?;
        assert_eq!(first.position, 1);
        let second = db.create_card(backlog, "Write docs", "", Some("#00ff00"))?;
        assert_eq!(second.position, 2);

        // Sibling groups are independent.
        let other = db.create_card(todo, "Plan sprint", "", None)?;
        assert_eq!(other.position, 1);
        Ok(())
    }

    #[test]
    fn test_position_gaps_are_never_compacted() -> Result<()> {
        let db = BoardDb::new_in_memory()?;
        let detail = db.create_board("b")?;
        let list = detail.lists[0].id;

        let a = db.create_card(list, "a", "", None)?;
        let _b = db.create_card(list, "b", "", None)?;
        db.delete_card(a.id)?;

        // Deleting position 1 leaves a gap; the next insert still goes
        // after the surviving max.
        let c = db.create_card(list, "c", "", None)?;
        assert_eq!(c.position, 3);
        Ok(())
    }

    #[test]
    fn test_update_card_preserves_list_and_position_when_omitted() -> Result<()> {
        let db = BoardDb::new_in_memory()?;
        let detail = db.create_board("b")?;
        let list = detail.lists[0].id;
        let card = db.create_card(list, "old", "old desc", Some("#111111"))?;

        let updated = db
            .update_card(card.id, "new", "new desc", None, None, None)?
            .unwrap();
        assert_eq!(updated.title, "new");
        assert_eq!(updated.description, "new desc");
        assert_eq!(updated.color, None);
        assert_eq!(updated.list_id, list);
        assert_eq!(updated.position, card.position);
        Ok(())
    }

    #[test]
    fn test_update_card_moves_across_lists() -> Result<()> {
        let db = BoardDb::new_in_memory()?;
        let detail = db.create_board("b")?;
        let backlog = detail.lists[0].id;
        let done = detail.lists[3].id;
        let card = db.create_card(backlog, "ship it", "", None)?;

        let moved = db
            .update_card(card.id, "ship it", "", None, Some(done), Some(1))?
            .unwrap();
        assert_eq!(moved.list_id, done);
        assert_eq!(moved.position, 1);
        Ok(())
    }

    #[test]
    fn test_update_card_not_found() -> Result<()> {
        let db = BoardDb::new_in_memory()?;
        assert!(db.update_card(999, "t", "d", None, None, None)?.is_none());
        Ok(())
    }

    #[test]
    fn test_delete_board_cascades_lists_and_cards() -> Result<()> {
        let db = BoardDb::new_in_memory()?;
        let detail = db.create_board("doomed")?;
        let board_id = detail.board.id;
        let list = detail.lists[0].id;
        let card = db.create_card(list, "orphan-to-be", "", None)?;

        let deleted = db.delete_board(board_id)?.unwrap();
        assert_eq!(deleted.id, board_id);

        assert!(db.get_board(board_id)?.is_none());
        assert!(db.get_board_detail(board_id)?.is_none());
        assert!(db.get_card(card.id)?.is_none());
        Ok(())
    }

    #[test]
    fn test_delete_board_not_found() -> Result<()> {
        let db = BoardDb::new_in_memory()?;
        assert!(db.delete_board(42)?.is_none());
        Ok(())
    }

    #[test]
    fn test_delete_board_leaves_other_boards_alone() -> Result<()> {
        let db = BoardDb::new_in_memory()?;
        let keep = db.create_board("keep")?;
        let drop = db.create_board("drop")?;
        let kept_card = db.create_card(keep.lists[0].id, "survives", "", None)?;

        db.delete_board(drop.board.id)?;

        let detail = db.get_board_detail(keep.board.id)?.unwrap();
        assert_eq!(detail.lists.len(), 4);
        assert_eq!(detail.lists[0].cards[0].id, kept_card.id);
        Ok(())
    }

    #[test]
    fn test_create_card_rejects_unknown_list() {
        let db = BoardDb::new_in_memory().unwrap();
        // FK enforcement: no such list, the insert must fail and leave
        // no row behind.
        assert!(db.create_card(123, "ghost", "", None).is_err());
    }

    #[test]
    fn test_board_detail_orders_by_position() -> Result<()> {
        let db = BoardDb::new_in_memory()?;
        let detail = db.create_board("b")?;
        let list = detail.lists[0].id;

        let a = db.create_card(list, "first", "", None)?;
        let b = db.create_card(list, "second", "", None)?;
        // Push "first" behind "second" via an explicit position write.
        db.update_card(a.id, "first", "", None, None, Some(5))?;

        let fetched = db.get_board_detail(detail.board.id)?.unwrap();
        let titles: Vec<&str> = fetched.lists[0]
            .cards
            .iter()
            .map(|c| c.title.as_str())
            .collect();
        assert_eq!(titles, vec!["second", "first"]);
        assert_eq!(fetched.lists[0].cards[0].id, b.id);
        Ok(())
    }

    #[test]
    fn test_list_boards_ordered_by_id() -> Result<()> {
        let db = BoardDb::new_in_memory()?;
        db.create_board("zebra")?;
        db.create_board("alpha")?;

        let boards = db.list_boards()?;
        assert_eq!(boards.len(), 2);
        assert_eq!(boards[0].name, "zebra");
        assert_eq!(boards[1].name, "alpha");
        Ok(())
    }

    #[test]
    fn test_description_defaults_to_empty() -> Result<()> {
        let db = BoardDb::new_in_memory()?;
        let detail = db.create_board("b")?;
        let card = db.create_card(detail.lists[0].id, "t", "", None)?;
        assert_eq!(card.description, "");
        Ok(())
    }
}
