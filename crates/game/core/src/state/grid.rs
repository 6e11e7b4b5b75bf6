//! Grid map owned by a single game instance.
//!
//! The grid is a row-major sequence of [`Tile`]s. Templates hand out grids
//! that are cloned structurally, so every instance exclusively owns its
//! cells and occupancy never leaks between rooms.

use std::fmt;

use strum::{Display, EnumIter};

use super::{Bonus, PlayerId, Position};

/// Terrain of a single cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case")]
pub enum TileKind {
    Wall,
    Floor,
    Water,
    Ice,
    DoorOpen,
    DoorClosed,
}

impl TileKind {
    /// Budget consumed when entering a cell of this kind, `None` when the cell
    /// can't be entered at all.
    pub fn movement_cost(self) -> Option<u32> {
        match self {
            TileKind::Ice => Some(0),
            TileKind::Floor | TileKind::DoorOpen => Some(1),
            TileKind::Water => Some(2),
            TileKind::Wall | TileKind::DoorClosed => None,
        }
    }

    pub fn is_walkable(self) -> bool {
        self.movement_cost().is_some()
    }

    pub fn is_door(self) -> bool {
        matches!(self, TileKind::DoorOpen | TileKind::DoorClosed)
    }

    pub fn is_slippery(self) -> bool {
        matches!(self, TileKind::Ice)
    }

    /// Open doors close and closed doors open; any other kind is unchanged.
    pub fn toggled(self) -> Self {
        match self {
            TileKind::DoorOpen => TileKind::DoorClosed,
            TileKind::DoorClosed => TileKind::DoorOpen,
            other => other,
        }
    }
}

/// Item (or placement marker) lying on a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case")]
pub enum ItemKind {
    /// Eligible spawn cell; never collectible.
    StartingPoint,
    /// Objective flag: carried back to its holder's home it wins the game.
    FlagA,
    FlagB,
    /// Placeholder resolved into a unique item when the session starts.
    RandomItem,
    Sword,
    Shield,
    Boots,
    Potion,
    Amulet,
}

impl ItemKind {
    /// Items a random placeholder can turn into.
    pub const UNIQUE: [ItemKind; 5] = [
        ItemKind::Sword,
        ItemKind::Shield,
        ItemKind::Boots,
        ItemKind::Potion,
        ItemKind::Amulet,
    ];

    pub fn is_collectible(self) -> bool {
        !matches!(self, ItemKind::StartingPoint | ItemKind::RandomItem)
    }

    pub fn is_unique(self) -> bool {
        Self::UNIQUE.contains(&self)
    }

    /// Attribute bonus granted while the item is carried.
    pub fn bonus(self) -> Bonus {
        match self {
            ItemKind::Sword => Bonus::attack(2),
            ItemKind::Shield => Bonus::defense(2),
            ItemKind::Boots => Bonus::speed(2),
            ItemKind::Potion => Bonus::health(2),
            ItemKind::Amulet => Bonus {
                attack: 1,
                defense: 1,
                ..Bonus::NONE
            },
            ItemKind::StartingPoint | ItemKind::FlagA | ItemKind::FlagB | ItemKind::RandomItem => {
                Bonus::NONE
            }
        }
    }
}

/// A single grid cell: terrain, optional item and optional occupant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tile {
    pub kind: TileKind,
    #[cfg_attr(feature = "serde", serde(default))]
    pub item: Option<ItemKind>,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub occupant: Option<PlayerId>,
}

impl Tile {
    pub const fn new(kind: TileKind) -> Self {
        Self {
            kind,
            item: None,
            occupant: None,
        }
    }

    pub const fn with_item(mut self, item: ItemKind) -> Self {
        self.item = Some(item);
        self
    }

    pub fn is_occupied(&self) -> bool {
        self.occupant.is_some()
    }

    /// Walkable and nobody standing on it.
    pub fn is_free(&self) -> bool {
        self.kind.is_walkable() && !self.is_occupied()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("grid {width}x{height} expects {expected} tiles, got {actual}")]
    TileCountMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("row {row} has width {actual}, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("unknown tile symbol {symbol:?} at row {row}, column {column}")]
    UnknownSymbol {
        symbol: char,
        row: usize,
        column: usize,
    },

    #[error("grid layout is empty")]
    Empty,
}

/// Row-major grid of tiles.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawGrid"))]
pub struct Grid {
    width: u32,
    height: u32,
    tiles: Vec<Tile>,
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawGrid {
    width: u32,
    height: u32,
    tiles: Vec<Tile>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawGrid> for Grid {
    type Error = GridError;

    fn try_from(raw: RawGrid) -> Result<Self, Self::Error> {
        Grid::new(raw.width, raw.height, raw.tiles)
    }
}

impl Grid {
    pub fn new(width: u32, height: u32, tiles: Vec<Tile>) -> Result<Self, GridError> {
        let expected = width as usize * height as usize;
        if tiles.len() != expected {
            return Err(GridError::TileCountMismatch {
                width,
                height,
                expected,
                actual: tiles.len(),
            });
        }
        Ok(Self {
            width,
            height,
            tiles,
        })
    }

    /// Grid where every cell has the same terrain.
    pub fn filled(width: u32, height: u32, kind: TileKind) -> Self {
        Self {
            width,
            height,
            tiles: vec![Tile::new(kind); width as usize * height as usize],
        }
    }

    /// Parses a compact text layout, one row per line.
    ///
    /// ```text
    /// #  wall        .  floor       ~  water       *  ice
    /// /  open door   |  closed door
    /// S  start       F  flag A      G  flag B      ?  random item
    /// w  sword       h  shield      b  boots       p  potion      a  amulet
    /// ```
    /// Item symbols lie on floor tiles. Blank lines and surrounding
    /// whitespace are ignored.
    pub fn parse(layout: &str) -> Result<Self, GridError> {
        let rows: Vec<&str> = layout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        let first = rows.first().ok_or(GridError::Empty)?;
        let width = first.chars().count();

        let mut tiles = Vec::with_capacity(width * rows.len());
        for (row, line) in rows.iter().enumerate() {
            let actual = line.chars().count();
            if actual != width {
                return Err(GridError::RaggedRow {
                    row,
                    expected: width,
                    actual,
                });
            }
            for (column, symbol) in line.chars().enumerate() {
                let tile = tile_from_symbol(symbol).ok_or(GridError::UnknownSymbol {
                    symbol,
                    row,
                    column,
                })?;
                tiles.push(tile);
            }
        }

        Self::new(width as u32, rows.len() as u32, tiles)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn contains(&self, position: Position) -> bool {
        position.x >= 0
            && position.y >= 0
            && position.x < self.width as i32
            && position.y < self.height as i32
    }

    fn index(&self, position: Position) -> Option<usize> {
        self.contains(position)
            .then(|| position.y as usize * self.width as usize + position.x as usize)
    }

    fn position_at(&self, index: usize) -> Position {
        let width = self.width as usize;
        Position::new((index % width) as i32, (index / width) as i32)
    }

    pub fn tile(&self, position: Position) -> Option<&Tile> {
        self.index(position).map(|index| &self.tiles[index])
    }

    pub fn tile_mut(&mut self, position: Position) -> Option<&mut Tile> {
        self.index(position).map(|index| &mut self.tiles[index])
    }

    pub fn kind(&self, position: Position) -> Option<TileKind> {
        self.tile(position).map(|tile| tile.kind)
    }

    pub fn item(&self, position: Position) -> Option<ItemKind> {
        self.tile(position).and_then(|tile| tile.item)
    }

    pub fn occupant(&self, position: Position) -> Option<PlayerId> {
        self.tile(position).and_then(|tile| tile.occupant)
    }

    /// In bounds, walkable and unoccupied.
    pub fn is_free(&self, position: Position) -> bool {
        self.tile(position).is_some_and(Tile::is_free)
    }

    /// Iterates every cell with its position in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (Position, &Tile)> + '_ {
        self.tiles
            .iter()
            .enumerate()
            .map(|(index, tile)| (self.position_at(index), tile))
    }

    /// Positions holding the given item, row-major.
    pub fn positions_with(&self, item: ItemKind) -> Vec<Position> {
        self.cells()
            .filter(|(_, tile)| tile.item == Some(item))
            .map(|(position, _)| position)
            .collect()
    }

    pub fn set_item(&mut self, position: Position, item: Option<ItemKind>) -> bool {
        match self.tile_mut(position) {
            Some(tile) => {
                tile.item = item;
                true
            }
            None => false,
        }
    }

    pub fn set_occupant(&mut self, position: Position, occupant: Option<PlayerId>) -> bool {
        match self.tile_mut(position) {
            Some(tile) => {
                tile.occupant = occupant;
                true
            }
            None => false,
        }
    }

    pub fn set_kind(&mut self, position: Position, kind: TileKind) -> bool {
        match self.tile_mut(position) {
            Some(tile) => {
                tile.kind = kind;
                true
            }
            None => false,
        }
    }

    /// Copy of the grid with every closed door opened, used for planning.
    pub fn with_doors_open(&self) -> Grid {
        let mut grid = self.clone();
        for tile in &mut grid.tiles {
            if tile.kind == TileKind::DoorClosed {
                tile.kind = TileKind::DoorOpen;
            }
        }
        grid
    }

    pub fn count_where(&self, predicate: impl Fn(&Tile) -> bool) -> usize {
        self.tiles.iter().filter(|tile| predicate(tile)).count()
    }
}

fn tile_from_symbol(symbol: char) -> Option<Tile> {
    let floor = Tile::new(TileKind::Floor);
    let tile = match symbol {
        '#' => Tile::new(TileKind::Wall),
        '.' => floor,
        '~' => Tile::new(TileKind::Water),
        '*' => Tile::new(TileKind::Ice),
        '/' => Tile::new(TileKind::DoorOpen),
        '|' => Tile::new(TileKind::DoorClosed),
        'S' => floor.with_item(ItemKind::StartingPoint),
        'F' => floor.with_item(ItemKind::FlagA),
        'G' => floor.with_item(ItemKind::FlagB),
        '?' => floor.with_item(ItemKind::RandomItem),
        'w' => floor.with_item(ItemKind::Sword),
        'h' => floor.with_item(ItemKind::Shield),
        'b' => floor.with_item(ItemKind::Boots),
        'p' => floor.with_item(ItemKind::Potion),
        'a' => floor.with_item(ItemKind::Amulet),
        _ => return None,
    };
    Some(tile)
}

fn symbol_for(tile: &Tile) -> char {
    if tile.occupant.is_some() {
        return '@';
    }
    match (tile.kind, tile.item) {
        (_, Some(ItemKind::StartingPoint)) => 'S',
        (_, Some(ItemKind::FlagA)) => 'F',
        (_, Some(ItemKind::FlagB)) => 'G',
        (_, Some(ItemKind::RandomItem)) => '?',
        (_, Some(ItemKind::Sword)) => 'w',
        (_, Some(ItemKind::Shield)) => 'h',
        (_, Some(ItemKind::Boots)) => 'b',
        (_, Some(ItemKind::Potion)) => 'p',
        (_, Some(ItemKind::Amulet)) => 'a',
        (TileKind::Wall, None) => '#',
        (TileKind::Floor, None) => '.',
        (TileKind::Water, None) => '~',
        (TileKind::Ice, None) => '*',
        (TileKind::DoorOpen, None) => '/',
        (TileKind::DoorClosed, None) => '|',
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.tiles.chunks(self.width.max(1) as usize) {
            let line: String = row.iter().map(symbol_for).collect();
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}
