//! Client-side view model for one open board: the loaded board, its
//! lists and each list's cards, mutated optimistically and kept in step
//! with the server. The server stays the source of truth; on a failed
//! write the view refetches the board instead of trusting local state.

use crate::client::{ApiClient, ClientError};
use crate::models::{Board, Card, CreateCardRequest, List, UpdateCardRequest};

/// A position within the board: which list, and the index among that
/// list's cards as currently displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragLocation {
    pub list_id: i64,
    pub index: usize,
}

/// A completed drag gesture. `destination` is `None` when the card was
/// dropped outside any valid target.
#[derive(Debug, Clone, Copy)]
pub struct CardMove {
    pub card_id: i64,
    pub source: DragLocation,
    pub destination: Option<DragLocation>,
}

impl CardMove {
    /// Dropped outside a target, or back where it started.
    fn is_noop(&self) -> bool {
        match self.destination {
            None => true,
            Some(dest) => dest == self.source,
        }
    }
}

pub struct BoardView {
    client: ApiClient,
    board: Board,
    lists: Vec<List>,
}

impl BoardView {
    /// Fetch the board and build a view over it.
    pub async fn load(client: ApiClient, board_id: i64) -> Result<Self, ClientError> {
        let detail = client.get_board(board_id).await?;
        Ok(Self {
            client,
            board: detail.board,
            lists: detail.lists,
        })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn lists(&self) -> &[List] {
        &self.lists
    }

    /// Re-fetch the board, replacing local state with server truth.
    pub async fn refresh(&mut self) -> Result<(), ClientError> {
        let detail = self.client.get_board(self.board.id).await?;
        self.board = detail.board;
        self.lists = detail.lists;
        Ok(())
    }

    /// Create a card at the end of a list. Blank titles are rejected
    /// here, before any network call; the server itself accepts them.
    pub async fn add_card(
        &mut self,
        list_id: i64,
        title: &str,
        description: &str,
        color: Option<String>,
    ) -> Result<Option<Card>, ClientError> {
        if title.trim().is_empty() {
            return Ok(None);
        }
        let card = self
            .client
            .create_card(&CreateCardRequest {
                list_id,
                title: title.to_string(),
                description: Some(description.to_string()),
                color,
            })
            .await?;
        if let Some(list) = self.lists.iter_mut().find(|l| l.id == list_id) {
            list.cards.push(card.clone());
        }
        Ok(Some(card))
    }

    /// Overwrite a card's title, description and color in place; its
    /// list and position are left untouched.
    pub async fn edit_card(
        &mut self,
        card_id: i64,
        title: &str,
        description: &str,
        color: Option<String>,
    ) -> Result<Option<Card>, ClientError> {
        let Some(list_id) = self.find_card_list(card_id) else {
            return Ok(None);
        };
        let updated = self
            .client
            .update_card(
                card_id,
                &UpdateCardRequest {
                    title: title.to_string(),
                    description: description.to_string(),
                    color,
                    list_id: Some(list_id),
                    position: None,
                },
            )
            .await?;
        if let Some(list) = self.lists.iter_mut().find(|l| l.id == list_id) {
            if let Some(card) = list.cards.iter_mut().find(|c| c.id == card_id) {
                *card = updated.clone();
            }
        }
        Ok(Some(updated))
    }

    pub async fn delete_card(&mut self, card_id: i64) -> Result<(), ClientError> {
        self.client.delete_card(card_id).await?;
        for list in &mut self.lists {
            list.cards.retain(|c| c.id != card_id);
        }
        Ok(())
    }

    /// Drag-and-drop reorder. The move is applied to local state first,
    /// then persisted with a single PUT carrying the destination list
    /// and `position = destination index + 1`. Sibling positions are
    /// never rewritten, so repeated moves can leave duplicate position
    /// values; ties display in fetch order.
    ///
    /// Returns `false` when the gesture was a no-op and nothing was
    /// sent. When the PUT fails, the board is refetched so local state
    /// converges back to the server before the error is returned.
    pub async fn move_card(&mut self, mv: CardMove) -> Result<bool, ClientError> {
        let Some(dest) = mv.destination else {
            return Ok(false);
        };
        if mv.is_noop() {
            return Ok(false);
        }

        let Some(moved) = apply_move(&mut self.lists, &mv) else {
            // Local state disagrees with the gesture (stale indices);
            // resync and drop the move.
            self.refresh().await?;
            return Ok(false);
        };

        let payload = UpdateCardRequest {
            title: moved.title.clone(),
            description: moved.description.clone(),
            color: moved.color.clone(),
            list_id: Some(dest.list_id),
            position: Some(dest.index as i32 + 1),
        };
        match self.client.update_card(moved.id, &payload).await {
            Ok(updated) => {
                if let Some(list) = self.lists.iter_mut().find(|l| l.id == dest.list_id) {
                    if let Some(card) = list.cards.iter_mut().find(|c| c.id == updated.id) {
                        *card = updated;
                    }
                }
                Ok(true)
            }
            Err(err) => {
                tracing::warn!(card_id = mv.card_id, error = %err, "card move failed, refetching board");
                if let Err(refetch_err) = self.refresh().await {
                    tracing::error!(error = %refetch_err, "board refetch after failed move also failed");
                }
                Err(err)
            }
        }
    }

    fn find_card_list(&self, card_id: i64) -> Option<i64> {
        self.lists
            .iter()
            .find(|l| l.cards.iter().any(|c| c.id == card_id))
            .map(|l| l.id)
    }
}

/// Splice the moved card out of the source list and into the
/// destination list at the destination index. Returns `None` without
/// mutating anything when the gesture does not match local state.
fn apply_move(lists: &mut [List], mv: &CardMove) -> Option<Card> {
    let dest = mv.destination?;

    let src_idx = lists.iter().position(|l| l.id == mv.source.list_id)?;
    let dest_idx = lists.iter().position(|l| l.id == dest.list_id)?;
    let card = lists[src_idx].cards.get(mv.source.index)?;
    if card.id != mv.card_id {
        return None;
    }

    let card = lists[src_idx].cards.remove(mv.source.index);
    let dest_cards = &mut lists[dest_idx].cards;
    let insert_at = dest.index.min(dest_cards.len());
    dest_cards.insert(insert_at, card.clone());
    Some(card)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(id: i64, list_id: i64, title: &str, position: i32) -> Card {
        Card {
            id,
            list_id,
            title: title.to_string(),
            description: String::new(),
            position,
            color: None,
        }
    }

    fn list(id: i64, name: &str, cards: Vec<Card>) -> List {
        List {
            id,
            board_id: 1,
            name: name.to_string(),
            position: id as i32,
            cards,
        }
    }

    fn sample_lists() -> Vec<List> {
        vec![
            list(1, "Backlog", vec![card(10, 1, "a", 1), card(11, 1, "b", 2)]),
            list(2, "To Do", vec![card(20, 2, "c", 1)]),
        ]
    }

    #[test]
    fn test_noop_when_destination_missing() {
        let mv = CardMove {
            card_id: 10,
            source: DragLocation { list_id: 1, index: 0 },
            destination: None,
        };
        assert!(mv.is_noop());
    }

    #[test]
    fn test_noop_when_dropped_in_place() {
        let loc = DragLocation { list_id: 1, index: 0 };
        let mv = CardMove {
            card_id: 10,
            source: loc,
            destination: Some(loc),
        };
        assert!(mv.is_noop());
    }

    #[test]
    fn test_same_list_different_index_is_not_noop() {
        let mv = CardMove {
            card_id: 10,
            source: DragLocation { list_id: 1, index: 0 },
            destination: Some(DragLocation { list_id: 1, index: 1 }),
        };
        assert!(!mv.is_noop());
    }

    #[test]
    fn test_apply_move_across_lists() {
        let mut lists = sample_lists();
        let mv = CardMove {
            card_id: 11,
            source: DragLocation { list_id: 1, index: 1 },
            destination: Some(DragLocation { list_id: 2, index: 0 }),
        };
        let moved = apply_move(&mut lists, &mv).unwrap();
        assert_eq!(moved.id, 11);
        assert_eq!(lists[0].cards.len(), 1);
        let titles: Vec<&str> = lists[1].cards.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["b", "c"]);
    }

    #[test]
    fn test_apply_move_within_list() {
        let mut lists = sample_lists();
        let mv = CardMove {
            card_id: 10,
            source: DragLocation { list_id: 1, index: 0 },
            destination: Some(DragLocation { list_id: 1, index: 1 }),
        };
        apply_move(&mut lists, &mv).unwrap();
        let titles: Vec<&str> = lists[0].cards.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["b", "a"]);
    }

    #[test]
    fn test_apply_move_clamps_destination_index() {
        let mut lists = sample_lists();
        let mv = CardMove {
            card_id: 20,
            source: DragLocation { list_id: 2, index: 0 },
            destination: Some(DragLocation { list_id: 1, index: 99 }),
        };
        apply_move(&mut lists, &mv).unwrap();
        assert_eq!(lists[0].cards.last().unwrap().id, 20);
        assert!(lists[1].cards.is_empty());
    }

    #[test]
    fn test_apply_move_rejects_stale_gesture() {
        let mut lists = sample_lists();
        // Index 0 of list 1 holds card 10, not 11: stale drag data.
        let mv = CardMove {
            card_id: 11,
            source: DragLocation { list_id: 1, index: 0 },
            destination: Some(DragLocation { list_id: 2, index: 0 }),
        };
        assert!(apply_move(&mut lists, &mv).is_none());
        // Nothing changed.
        assert_eq!(lists[0].cards.len(), 2);
        assert_eq!(lists[1].cards.len(), 1);
    }

    #[test]
    fn test_apply_move_rejects_unknown_list() {
        let mut lists = sample_lists();
        let mv = CardMove {
            card_id: 10,
            source: DragLocation { list_id: 1, index: 0 },
            destination: Some(DragLocation { list_id: 42, index: 0 }),
        };
        assert!(apply_move(&mut lists, &mv).is_none());
    }
}
