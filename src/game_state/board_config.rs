//! Static board geometry: dimensions, home bands, no-guard zones and the
//! fixed coordinates of spawns, flags and rescue keys.
//!
//! A `BoardConfig` is validated once when a match is created. Every query
//! here is pure and cheap; the round pipeline and the scorer call them in
//! tight loops.

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::game_state::game_types::{Cell, Side};

/// Largest board edge accepted by validation.
pub const MAX_BOARD_DIMENSION: i32 = 200;

/// Thinnest home band that still leaves room for a zone beside the front row.
pub const MIN_HOME_ROWS: i32 = 2;

/// Inclusive rectangle of cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneRect {
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
}

impl ZoneRect {
    #[inline]
    pub const fn contains(&self, cell: Cell) -> bool {
        cell.x >= self.min_x && cell.x <= self.max_x && cell.y >= self.min_y && cell.y <= self.max_y
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardConfig {
    pub width: i32,
    pub height: i32,
    /// Rows owned by each side, counted from its back rank.
    pub home_rows: i32,
    /// Canonical spawn per piece id, indexed by `Side::index`.
    pub spawns: [Vec<Cell>; 2],
    pub flag_spawns: [Cell; 2],
    /// `key_positions[s]` is the key that frees side `s`; it sits in the
    /// opposing territory.
    pub key_positions: [Cell; 2],
    pub zones: [ZoneRect; 2],
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl BoardConfig {
    /// 7x10 board, three pieces a side, four home rows each.
    pub fn standard() -> Self {
        Self::derive(7, 10, 3, 4)
    }

    /// Build a board from its four shape parameters and validate it.
    ///
    /// Flags sit in the centre of each back rank, zones are three columns
    /// wide and up to two rows deep, pieces spawn spread along the front
    /// row of their home band.
    pub fn new(
        width: i32,
        height: i32,
        pieces_per_side: usize,
        home_rows: i32,
    ) -> Result<Self, ConfigError> {
        if width < 1 || height < 2 || width > MAX_BOARD_DIMENSION || height > MAX_BOARD_DIMENSION
        {
            return Err(ConfigError::InvalidDimensions { width, height });
        }
        if home_rows < MIN_HOME_ROWS || home_rows * 2 > height {
            return Err(ConfigError::OverlappingHomeBands { home_rows, height });
        }
        if pieces_per_side == 0 || pieces_per_side > width as usize {
            return Err(ConfigError::InvalidPieceCount {
                side: Side::North,
                count: pieces_per_side,
            });
        }
        let config = Self::derive(width, height, pieces_per_side, home_rows);
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON board description and validate it.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: BoardConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn derive(width: i32, height: i32, pieces_per_side: usize, home_rows: i32) -> Self {
        let centre = width / 2;
        let zone_depth = 2.min(home_rows - 1);
        let north_front = home_rows - 1;
        let south_front = height - home_rows;

        let spread = |row: i32| -> Vec<Cell> {
            (0..pieces_per_side)
                .map(|i| {
                    let x = ((i as i32 + 1) * width) / (pieces_per_side as i32 + 1);
                    Cell::new(x, row)
                })
                .collect()
        };

        Self {
            width,
            height,
            home_rows,
            spawns: [spread(north_front), spread(south_front)],
            flag_spawns: [Cell::new(centre, 0), Cell::new(centre, height - 1)],
            key_positions: [Cell::new(0, south_front), Cell::new(width - 1, north_front)],
            zones: [
                ZoneRect {
                    min_x: centre - 1,
                    max_x: centre + 1,
                    min_y: 0,
                    max_y: zone_depth - 1,
                },
                ZoneRect {
                    min_x: centre - 1,
                    max_x: centre + 1,
                    min_y: height - zone_depth,
                    max_y: height - 1,
                },
            ],
        }
    }

    /// Reject impossible geometry. Called before any round executes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width < 1
            || self.height < 2
            || self.width > MAX_BOARD_DIMENSION
            || self.height > MAX_BOARD_DIMENSION
        {
            return Err(ConfigError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if self.home_rows < MIN_HOME_ROWS || self.home_rows * 2 > self.height {
            return Err(ConfigError::OverlappingHomeBands {
                home_rows: self.home_rows,
                height: self.height,
            });
        }

        for side in Side::ALL {
            let s = side.index();
            let spawns = &self.spawns[s];
            if spawns.is_empty() || spawns.len() > usize::from(u8::MAX) {
                return Err(ConfigError::InvalidPieceCount {
                    side,
                    count: spawns.len(),
                });
            }
            for (i, &cell) in spawns.iter().enumerate() {
                self.require_in_bounds("spawn", side, cell)?;
                if !self.in_home_territory(side, cell) {
                    return Err(ConfigError::WrongTerritory {
                        what: "spawn",
                        side,
                        cell,
                    });
                }
                if self.zones[s].contains(cell) {
                    return Err(ConfigError::SpawnInsideZone { side, cell });
                }
                if spawns[..i].contains(&cell) {
                    return Err(ConfigError::DuplicateSpawn { side, cell });
                }
            }

            let flag = self.flag_spawns[s];
            self.require_in_bounds("flag", side, flag)?;
            if !self.in_home_territory(side, flag) {
                return Err(ConfigError::WrongTerritory {
                    what: "flag",
                    side,
                    cell: flag,
                });
            }

            let zone = self.zones[s];
            let corners = [
                Cell::new(zone.min_x, zone.min_y),
                Cell::new(zone.max_x, zone.max_y),
            ];
            if zone.is_empty()
                || !zone.contains(flag)
                || corners
                    .iter()
                    .any(|&c| !self.in_bounds(c) || !self.in_home_territory(side, c))
            {
                return Err(ConfigError::MalformedZone { side });
            }

            let key = self.key_positions[s];
            self.require_in_bounds("rescue key", side, key)?;
            if !self.in_home_territory(side.opposite(), key) {
                return Err(ConfigError::WrongTerritory {
                    what: "rescue key",
                    side,
                    cell: key,
                });
            }
        }
        Ok(())
    }

    fn require_in_bounds(
        &self,
        what: &'static str,
        side: Side,
        cell: Cell,
    ) -> Result<(), ConfigError> {
        if self.in_bounds(cell) {
            Ok(())
        } else {
            Err(ConfigError::OffBoard { what, side, cell })
        }
    }

    #[inline]
    pub const fn in_bounds(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.y >= 0 && cell.x < self.width && cell.y < self.height
    }

    /// Owner of the row band containing `cell`, `None` for neutral rows.
    #[inline]
    pub const fn territory_owner(&self, cell: Cell) -> Option<Side> {
        if cell.y < self.home_rows {
            Some(Side::North)
        } else if cell.y >= self.height - self.home_rows {
            Some(Side::South)
        } else {
            None
        }
    }

    #[inline]
    pub fn in_home_territory(&self, side: Side, cell: Cell) -> bool {
        self.territory_owner(cell) == Some(side)
    }

    /// Geometric test only; whether the zone is active is game state.
    #[inline]
    pub const fn in_no_guard_zone(&self, side: Side, cell: Cell) -> bool {
        self.zones[side.index()].contains(cell)
    }

    #[inline]
    pub const fn back_rank(&self, side: Side) -> i32 {
        match side {
            Side::North => 0,
            Side::South => self.height - 1,
        }
    }

    #[inline]
    pub const fn is_back_rank(&self, side: Side, cell: Cell) -> bool {
        cell.y == self.back_rank(side)
    }

    #[inline]
    pub fn spawn(&self, side: Side, piece_id: u8) -> Option<Cell> {
        self.spawns[side.index()].get(usize::from(piece_id)).copied()
    }

    #[inline]
    pub fn pieces_per_side(&self, side: Side) -> usize {
        self.spawns[side.index()].len()
    }

    /// Longest straight move worth searching.
    #[inline]
    pub fn max_dimension(&self) -> i32 {
        self.width.max(self.height)
    }
}
