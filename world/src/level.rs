//! Play state layered over a generated level layout.

use crawler_core::{Event, GridPoint, LevelLayout};

/// Half-width of the square of cells revealed around the player.
pub(crate) const DISCOVERY_RADIUS: i32 = 4;

/// Generated layout together with the flags that change while it is played.
///
/// The layout itself never changes after generation; only the flags and the
/// discovery matrix mutate, and a level transition replaces the whole value.
#[derive(Clone, Debug)]
pub struct LevelState {
    layout: LevelLayout,
    discovered: Vec<bool>,
    has_key: bool,
    key_discovered: bool,
    portal_discovered: bool,
    lever_activated: bool,
}

impl LevelState {
    pub(crate) fn new(layout: LevelLayout) -> Self {
        let discovered = vec![false; layout.grid.cells().len()];
        Self {
            layout,
            discovered,
            has_key: false,
            key_discovered: false,
            portal_discovered: false,
            lever_activated: false,
        }
    }

    /// Generated layout backing the level.
    #[must_use]
    pub fn layout(&self) -> &LevelLayout {
        &self.layout
    }

    /// Reports whether the player carries the key.
    #[must_use]
    pub const fn has_key(&self) -> bool {
        self.has_key
    }

    /// Reports whether the key cell has been uncovered on the minimap.
    #[must_use]
    pub const fn key_discovered(&self) -> bool {
        self.key_discovered
    }

    /// Reports whether the exit portal has been uncovered on the minimap.
    #[must_use]
    pub const fn portal_discovered(&self) -> bool {
        self.portal_discovered
    }

    /// Reports whether the lever has been pulled.
    #[must_use]
    pub const fn lever_activated(&self) -> bool {
        self.lever_activated
    }

    /// Row-major fog-of-war matrix matching the grid dimensions.
    #[must_use]
    pub fn discovered(&self) -> &[bool] {
        &self.discovered
    }

    /// Reports whether the cell has been uncovered.
    #[must_use]
    pub fn is_discovered(&self, point: GridPoint) -> bool {
        self.layout
            .grid
            .index(point)
            .and_then(|index| self.discovered.get(index).copied())
            .unwrap_or(false)
    }

    pub(crate) fn reset_progress(&mut self) {
        self.has_key = false;
        self.key_discovered = false;
        self.portal_discovered = false;
        self.lever_activated = false;
        self.discovered.iter_mut().for_each(|cell| *cell = false);
    }

    pub(crate) fn collect_key(&mut self) {
        self.has_key = true;
        self.key_discovered = true;
    }

    pub(crate) fn activate_lever(&mut self) {
        self.lever_activated = true;
    }

    /// Uncovers the square of cells around `center`.
    pub(crate) fn reveal_around(&mut self, center: GridPoint, out_events: &mut Vec<Event>) {
        for dy in -DISCOVERY_RADIUS..=DISCOVERY_RADIUS {
            for dx in -DISCOVERY_RADIUS..=DISCOVERY_RADIUS {
                if let Some(point) = center.offset(dx, dy) {
                    self.mark(point);
                }
            }
        }
        self.refresh_flags(out_events);
    }

    /// Uncovers the floor cells of the treasure room and its surrounding ring.
    pub(crate) fn reveal_treasure_area(&mut self, out_events: &mut Vec<Event>) {
        let Some(bounds) = self.layout.treasure_room().map(|room| room.bounds) else {
            return;
        };
        let min_x = bounds.x().saturating_sub(1);
        let min_y = bounds.y().saturating_sub(1);
        let max_x = (bounds.x() + bounds.width()).min(self.layout.grid.width().saturating_sub(1));
        let max_y = (bounds.y() + bounds.height()).min(self.layout.grid.height().saturating_sub(1));
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let point = GridPoint::new(x, y);
                if self.layout.grid.is_floor(point) {
                    self.mark(point);
                }
            }
        }
        self.refresh_flags(out_events);
    }

    fn mark(&mut self, point: GridPoint) {
        if let Some(slot) = self
            .layout
            .grid
            .index(point)
            .and_then(|index| self.discovered.get_mut(index))
        {
            *slot = true;
        }
    }

    fn refresh_flags(&mut self, out_events: &mut Vec<Event>) {
        if !self.key_discovered && self.is_discovered(self.layout.key_cell) {
            self.key_discovered = true;
            out_events.push(Event::KeyDiscovered);
        }
        if !self.portal_discovered && self.is_discovered(self.layout.exit_room.center) {
            self.portal_discovered = true;
            out_events.push(Event::PortalDiscovered);
        }
    }
}
