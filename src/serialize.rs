//! Transactional persistence of traced paths to SQLite.
//!
//! The source this crate is grounded on serialized through a global static
//! connection and a monotonically incrementing static id, built by
//! concatenating `INSERT` statements as strings. This rewrite keeps the
//! schema and the batch-transaction discipline but carries the connection
//! and the id counter as instance state, and binds every value as a
//! parameter instead of formatting it into the SQL text.
//!
//! `node` rows are keyed by the node's own monotonic id (the `path_id`
//! column - the name is inherited from the source schema, where it denotes
//! the node's id within its path's chain, not a foreign key to `path`).
//! `path` rows instead point *at* their nodes: `node_ids` is a
//! space-separated list of those node ids, camera-first, the order the
//! path was traced in.

use std::path::Path as FsPath;

use rusqlite::{params, Connection};

use crate::error::StoreError;
use crate::intersection::Intersection;
use crate::path::PathNode;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS node (
    path_id INTEGER PRIMARY KEY,
    Lo_x REAL NOT NULL, Lo_y REAL NOT NULL, Lo_z REAL NOT NULL,
    wo_x REAL NOT NULL, wo_y REAL NOT NULL, wo_z REAL NOT NULL,
    pos_out_x REAL NOT NULL, pos_out_y REAL NOT NULL, pos_out_z REAL NOT NULL,
    inter_happened INTEGER NOT NULL,
    inter_pos_x REAL NOT NULL, inter_pos_y REAL NOT NULL, inter_pos_z REAL NOT NULL,
    Li_light_x REAL NOT NULL, Li_light_y REAL NOT NULL, Li_light_z REAL NOT NULL,
    wi_light_x REAL NOT NULL, wi_light_y REAL NOT NULL, wi_light_z REAL NOT NULL,
    inter_light_happened INTEGER NOT NULL,
    inter_light_pos_x REAL NOT NULL, inter_light_pos_y REAL NOT NULL, inter_light_pos_z REAL NOT NULL,
    Li_obj_x REAL NOT NULL, Li_obj_y REAL NOT NULL, Li_obj_z REAL NOT NULL,
    wi_obj_x REAL NOT NULL, wi_obj_y REAL NOT NULL, wi_obj_z REAL NOT NULL,
    inter_obj_happened INTEGER NOT NULL,
    inter_obj_pos_x REAL NOT NULL, inter_obj_pos_y REAL NOT NULL, inter_obj_pos_z REAL NOT NULL,
    RR REAL NOT NULL,
    inter_obj_is_emission INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS path (
    row INTEGER NOT NULL,
    col INTEGER NOT NULL,
    node_cnt INTEGER NOT NULL,
    node_ids TEXT NOT NULL
);
";

/// Owns the SQLite connection and the next node id to hand out. Intended
/// for single-threaded use by the Ant consumer; nothing here is `Sync`.
pub struct Serializer {
    conn: Connection,
    next_node_id: i64,
}

impl Serializer {
    pub fn open(path: &FsPath) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|source| StoreError::Open { path: path.to_path_buf(), source })?;
        Self::from_connection(conn)
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        let next_node_id = conn
            .query_row("SELECT COALESCE(MAX(path_id), 0) + 1 FROM node", [], |row| row.get(0))
            .unwrap_or(1);
        Ok(Serializer { conn, next_node_id })
    }

    /// Deletes every row from both tables without dropping them, so a
    /// fresh render into an existing database file starts from empty.
    pub fn truncate(&mut self) -> Result<(), StoreError> {
        self.conn.execute_batch("DELETE FROM node; DELETE FROM path;")?;
        self.next_node_id = 1;
        Ok(())
    }

    pub fn begin_transaction(&self) -> Result<(), StoreError> {
        self.conn.execute_batch("BEGIN")?;
        Ok(())
    }

    pub fn commit_transaction(&self) -> Result<(), StoreError> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    /// Inserts one path-node row, returning the node's own monotonic id so
    /// the caller can fold it into the owning path's `node_ids`.
    pub fn insert_path_node(&mut self, node: &PathNode) -> Result<i64, StoreError> {
        let id = self.next_node_id;
        let (inter_happened, inter_pos) = flatten(node.hit);
        let (inter_light_happened, inter_light_pos) = flatten(node.from_light.hit_light);
        let (inter_obj_happened, inter_obj_pos) = flatten(node.from_obj.hit_obj);

        self.conn.execute(
            "INSERT INTO node (
                path_id,
                Lo_x, Lo_y, Lo_z,
                wo_x, wo_y, wo_z,
                pos_out_x, pos_out_y, pos_out_z,
                inter_happened, inter_pos_x, inter_pos_y, inter_pos_z,
                Li_light_x, Li_light_y, Li_light_z,
                wi_light_x, wi_light_y, wi_light_z,
                inter_light_happened, inter_light_pos_x, inter_light_pos_y, inter_light_pos_z,
                Li_obj_x, Li_obj_y, Li_obj_z,
                wi_obj_x, wi_obj_y, wi_obj_z,
                inter_obj_happened, inter_obj_pos_x, inter_obj_pos_y, inter_obj_pos_z,
                RR, inter_obj_is_emission
            ) VALUES (
                ?1,
                ?2, ?3, ?4,
                ?5, ?6, ?7,
                ?8, ?9, ?10,
                ?11, ?12, ?13, ?14,
                ?15, ?16, ?17,
                ?18, ?19, ?20,
                ?21, ?22, ?23, ?24,
                ?25, ?26, ?27,
                ?28, ?29, ?30,
                ?31, ?32, ?33, ?34,
                ?35, ?36
            )",
            params![
                id,
                node.lo.x, node.lo.y, node.lo.z,
                node.wo.get().x, node.wo.get().y, node.wo.get().z,
                node.pos_out.x, node.pos_out.y, node.pos_out.z,
                inter_happened, inter_pos.x, inter_pos.y, inter_pos.z,
                node.from_light.li_light.x, node.from_light.li_light.y, node.from_light.li_light.z,
                node.from_light.wi_light.get().x, node.from_light.wi_light.get().y, node.from_light.wi_light.get().z,
                inter_light_happened, inter_light_pos.x, inter_light_pos.y, inter_light_pos.z,
                node.from_obj.li_obj.x, node.from_obj.li_obj.y, node.from_obj.li_obj.z,
                node.from_obj.wi_obj.get().x, node.from_obj.wi_obj.get().y, node.from_obj.wi_obj.get().z,
                inter_obj_happened, inter_obj_pos.x, inter_obj_pos.y, inter_obj_pos.z,
                node.from_obj.rr, node.from_obj.is_emission,
            ],
        )?;
        self.next_node_id += 1;
        Ok(id)
    }

    /// Inserts one path row: the pixel it belongs to, how many nodes it
    /// has, and their ids in camera-first order as a space-separated list.
    pub fn insert_path(&self, row: u32, col: u32, node_ids: &[i64]) -> Result<(), StoreError> {
        let node_cnt = node_ids.len() as i64;
        let ids_text = node_ids.iter().map(i64::to_string).collect::<Vec<_>>().join(" ");
        self.conn.execute(
            "INSERT INTO path (row, col, node_cnt, node_ids) VALUES (?1, ?2, ?3, ?4)",
            params![row, col, node_cnt, ids_text],
        )?;
        Ok(())
    }

    pub fn count_paths(&self) -> Result<i64, StoreError> {
        Ok(self.conn.query_row("SELECT COUNT(*) FROM path", [], |row| row.get(0))?)
    }

    pub fn count_nodes(&self) -> Result<i64, StoreError> {
        Ok(self.conn.query_row("SELECT COUNT(*) FROM node", [], |row| row.get(0))?)
    }
}

/// Splits an optional intersection into its "did this happen" flag and a
/// position to store (zero when it didn't happen, since the column is
/// `NOT NULL` and a sentinel zero vector is distinguishable via the flag).
fn flatten(hit: Option<Intersection>) -> (bool, glam::Vec3) {
    match hit {
        Some(hit) => (true, hit.position),
        None => (false, glam::Vec3::ZERO),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Direction;
    use crate::material::Material;
    use crate::path::{FromLight, FromObj};
    use glam::Vec3;

    fn sample_node() -> PathNode {
        let hit = Intersection::new(1.0, Vec3::new(0.0, 1.0, 0.0), Direction::new(Vec3::Y), Material::Diffuse { albedo: Vec3::splat(0.8) });
        PathNode {
            lo: Vec3::splat(1.0),
            wo: Direction::new(Vec3::Y),
            pos_out: Vec3::new(0.0, 1.0, 0.0),
            hit: Some(hit),
            from_light: FromLight {
                li_light: Vec3::splat(2.0),
                wi_light: Direction::new(Vec3::X),
                hit_light: Some(hit),
            },
            from_obj: FromObj {
                rr: 0.3,
                li_obj: Vec3::splat(0.5),
                wi_obj: Direction::new(Vec3::Z),
                hit_obj: Some(hit),
                is_emission: false,
            },
        }
    }

    #[test]
    fn round_trips_a_path_through_two_tables() {
        let mut store = Serializer::in_memory().expect("in-memory store must open");
        store.begin_transaction().unwrap();
        let node_id = store.insert_path_node(&sample_node()).unwrap();
        store.insert_path(3, 7, &[node_id]).unwrap();
        store.commit_transaction().unwrap();

        assert_eq!(store.count_paths().unwrap(), 1);
        assert_eq!(store.count_nodes().unwrap(), 1);

        let node_ids: String = store
            .conn
            .query_row("SELECT node_ids FROM path", [], |row| row.get(0))
            .unwrap();
        assert_eq!(node_ids, node_id.to_string());
    }

    #[test]
    fn node_ids_are_space_separated_in_camera_first_insertion_order() {
        let mut store = Serializer::in_memory().expect("in-memory store must open");
        store.begin_transaction().unwrap();
        let first = store.insert_path_node(&sample_node()).unwrap();
        let second = store.insert_path_node(&sample_node()).unwrap();
        store.insert_path(0, 0, &[first, second]).unwrap();
        store.commit_transaction().unwrap();

        let node_ids: String = store
            .conn
            .query_row("SELECT node_ids FROM path", [], |row| row.get(0))
            .unwrap();
        assert_eq!(node_ids, format!("{first} {second}"));
    }

    #[test]
    fn truncate_empties_both_tables() {
        let mut store = Serializer::in_memory().expect("in-memory store must open");
        store.begin_transaction().unwrap();
        let node_id = store.insert_path_node(&PathNode::new(Vec3::ZERO, Direction::new(Vec3::Y))).unwrap();
        store.insert_path(0, 0, &[node_id]).unwrap();
        store.commit_transaction().unwrap();

        store.truncate().unwrap();
        assert_eq!(store.count_paths().unwrap(), 0);
        assert_eq!(store.count_nodes().unwrap(), 0);
    }
}
