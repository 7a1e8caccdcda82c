//! Name-keyed region cache.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::GenerationError;
use crate::seeds::WorldSeeds;
use crate::structures::generate_town;

use super::town::{build_town_region, TownParams};
use super::wilderness::{build_wilderness_region, generate_wilderness, WildernessParams};
use super::{Region, RegionKind};

/// What the first request for a region has to provide.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RegionParams {
    /// Building names; the first one is the entrance.
    Town { buildings: Vec<String> },
    /// Towns to anchor on the map. They must already exist in the repository.
    Wilderness { settlements: Vec<String>, with_liquid: bool },
}

/// Owns every generated region. The first request for a name generates it; later
/// requests return the cached region and ignore their parameters.
pub struct RegionRepository {
    seeds: WorldSeeds,
    regions: BTreeMap<String, Region>,
    pub wilderness: WildernessParams,
    pub town: TownParams,
}

impl RegionRepository {
    pub fn new(seeds: WorldSeeds) -> Self {
        Self::with_params(seeds, WildernessParams::default(), TownParams::default())
    }

    pub fn with_params(seeds: WorldSeeds, wilderness: WildernessParams, town: TownParams) -> Self {
        Self {
            seeds,
            regions: BTreeMap::new(),
            wilderness,
            town,
        }
    }

    pub fn seeds(&self) -> &WorldSeeds {
        &self.seeds
    }

    pub fn get_or_create(
        &mut self,
        name: &str,
        kind: RegionKind,
        dimensions: (usize, usize),
        params: Option<RegionParams>,
    ) -> Result<&mut Region, GenerationError> {
        let region = match self.regions.remove(name) {
            Some(cached) => {
                if cached.kind != kind {
                    warn!(region = name, cached = ?cached.kind, requested = ?kind, "region kind mismatch, returning cached");
                }
                debug!(region = name, "region cache hit");
                cached
            }
            None => self.create(name, kind, dimensions, params)?,
        };
        Ok(self.regions.entry(name.to_string()).or_insert(region))
    }

    fn create(
        &self,
        name: &str,
        kind: RegionKind,
        (width, height): (usize, usize),
        params: Option<RegionParams>,
    ) -> Result<Region, GenerationError> {
        let mut rng = self.seeds.region_rng(name);
        let region = match (kind, params) {
            (RegionKind::Town, Some(RegionParams::Town { buildings })) => {
                let layout = generate_town(width, height, &buildings, &self.town.layout, &mut rng)?;
                build_town_region(name, layout, &self.town, &mut rng)
            }
            (RegionKind::Wilderness, Some(RegionParams::Wilderness { settlements, with_liquid })) => {
                if let Some(missing) = settlements.iter().find(|s| !self.regions.contains_key(s.as_str())) {
                    return Err(GenerationError::UnknownSettlement(missing.clone()));
                }
                let layout = generate_wilderness(
                    name,
                    width,
                    height,
                    &settlements,
                    with_liquid,
                    &self.wilderness,
                    &mut rng,
                )?;
                build_wilderness_region(name, layout, &settlements, &self.wilderness, &mut rng)
            }
            (kind, _) => {
                return Err(GenerationError::MissingParameters {
                    region: name.to_string(),
                    kind,
                })
            }
        };
        info!(region = name, ?kind, width = region.grid.width(), height = region.grid.height(), "region created");
        Ok(region)
    }

    pub fn get(&self, name: &str) -> Option<&Region> {
        self.regions.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Region> {
        self.regions.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.regions.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.regions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buildings() -> RegionParams {
        RegionParams::Town {
            buildings: vec!["Gate".to_string(), "Inn".to_string(), "Smithy".to_string()],
        }
    }

    #[test]
    fn test_get_or_create_idempotent() {
        let mut repo = RegionRepository::new(WorldSeeds::from_master(11));
        let first = repo
            .get_or_create("Oakvale", RegionKind::Town, (41, 41), Some(buildings()))
            .unwrap()
            .grid
            .clone();
        let again = repo.get_or_create("Oakvale", RegionKind::Town, (41, 41), None).unwrap();
        assert_eq!(again.grid, first);
        assert_eq!(repo.len(), 1);
    }

    #[test]
    fn test_missing_parameters_fail() {
        let mut repo = RegionRepository::new(WorldSeeds::from_master(1));
        let err = repo.get_or_create("Oakvale", RegionKind::Town, (41, 41), None).unwrap_err();
        assert!(matches!(err, GenerationError::MissingParameters { kind: RegionKind::Town, .. }));

        let err = repo
            .get_or_create("Wild", RegionKind::Wilderness, (41, 41), Some(buildings()))
            .unwrap_err();
        assert!(matches!(err, GenerationError::MissingParameters { kind: RegionKind::Wilderness, .. }));
        assert!(repo.is_empty());
    }

    #[test]
    fn test_wilderness_needs_known_towns() {
        let mut repo = RegionRepository::new(WorldSeeds::from_master(2));
        let params = RegionParams::Wilderness {
            settlements: vec!["Nowhere".to_string()],
            with_liquid: false,
        };
        let err = repo
            .get_or_create("Wild", RegionKind::Wilderness, (41, 41), Some(params))
            .unwrap_err();
        assert!(matches!(err, GenerationError::UnknownSettlement(name) if name == "Nowhere"));
    }

    #[test]
    fn test_regions_independent_of_request_order() {
        let seeds = WorldSeeds::from_master(99);
        let mut a = RegionRepository::new(seeds);
        let mut b = RegionRepository::new(seeds);
        a.get_or_create("Oakvale", RegionKind::Town, (41, 41), Some(buildings())).unwrap();
        a.get_or_create("Elmford", RegionKind::Town, (41, 41), Some(buildings())).unwrap();
        b.get_or_create("Elmford", RegionKind::Town, (41, 41), Some(buildings())).unwrap();
        b.get_or_create("Oakvale", RegionKind::Town, (41, 41), Some(buildings())).unwrap();
        assert_eq!(a.get("Oakvale").unwrap().grid, b.get("Oakvale").unwrap().grid);
        assert_eq!(a.names().collect::<Vec<_>>(), vec!["Elmford", "Oakvale"]);
    }

    #[test]
    fn test_errors_leave_cache_untouched() {
        let mut repo = RegionRepository::new(WorldSeeds::from_master(3));
        let too_many = RegionParams::Town {
            buildings: (0..40).map(|i| format!("House {}", i)).collect(),
        };
        assert!(repo
            .get_or_create("Crowded", RegionKind::Town, (41, 41), Some(too_many))
            .is_err());
        assert!(!repo.contains("Crowded"));
    }
}
