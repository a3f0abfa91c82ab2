//! Region repository.
//!
//! Owns the resolved region index. Reads take a shared lock; reloads and
//! shape commits take the exclusive lock, so no query ever observes a
//! half-built index.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use regionward_domain::region::merge_flags;
use regionward_domain::{
    Position, RegionArtifact, RegionDefinition, RegionId, RegionModel, RegionShape, SelectionMode,
};
use regionward_shared::derive_nodes;

use crate::flags::evaluation::FlagCacheInvalidator;
use crate::infrastructure::artifact_storage::RegionArtifactStorage;
use crate::infrastructure::ports::{RegionDefinitionSource, RepoError};

/// Identity lookups used for lineage walks.
#[cfg_attr(test, mockall::automock)]
pub trait RegionLookup: Send + Sync {
    fn find_by_id(&self, id: &RegionId) -> Option<Arc<RegionModel>>;
}

/// Ordered chain `[root, ..., id]`. Stops at a missing parent or a repeated id.
pub fn lineage_of(lookup: &dyn RegionLookup, id: &RegionId) -> Vec<Arc<RegionModel>> {
    let mut chain = Vec::new();
    let mut visited = HashSet::new();
    let mut next = Some(id.clone());
    while let Some(current) = next.take() {
        if !visited.insert(current.clone()) {
            break;
        }
        let Some(region) = lookup.find_by_id(&current) else {
            break;
        };
        next = region.parent_id.clone();
        chain.push(region);
    }
    chain.reverse();
    chain
}

pub struct RegionRepository {
    source: Arc<dyn RegionDefinitionSource>,
    storage: Arc<RegionArtifactStorage>,
    regions: RwLock<HashMap<RegionId, Arc<RegionModel>>>,
    invalidator: OnceLock<Weak<dyn FlagCacheInvalidator>>,
}

impl RegionRepository {
    pub fn new(source: Arc<dyn RegionDefinitionSource>, storage: Arc<RegionArtifactStorage>) -> Self {
        Self {
            source,
            storage,
            regions: RwLock::new(HashMap::new()),
            invalidator: OnceLock::new(),
        }
    }

    /// Connects the cache that must be dropped when regions change. Only the first call wins.
    pub fn attach_invalidator(&self, invalidator: Weak<dyn FlagCacheInvalidator>) {
        if self.invalidator.set(invalidator).is_err() {
            tracing::warn!("Flag cache invalidator already attached, ignoring");
        }
    }

    /// Rebuilds every region from the definition source and swaps the index.
    ///
    /// Returns the number of regions loaded.
    pub async fn reload(&self) -> Result<usize, RepoError> {
        let definitions = self.source.load_definitions().await?;

        let mut order = Vec::with_capacity(definitions.len());
        let mut pending: HashMap<RegionId, (RegionDefinition, RegionShape)> = HashMap::new();
        for definition in definitions {
            if definition.id.is_blank() {
                tracing::warn!("Skipping region definition with a blank id");
                continue;
            }
            let shape = self.storage.resolve_shape(definition.artifact.as_ref()).await;
            let id = definition.id.clone();
            if pending.insert(id.clone(), (definition, shape)).is_some() {
                tracing::warn!(region_id = %id, "Duplicate region definition, keeping the last one");
            } else {
                order.push(id);
            }
        }

        let index = HierarchyResolver::new(&pending).resolve_all(&order);
        let count = index.len();
        *self.write() = index;

        tracing::info!(regions = count, "Regions reloaded");
        if let Some(invalidator) = self.invalidator() {
            invalidator.invalidate_all();
        }
        Ok(count)
    }

    /// Regions containing `position`, highest priority first. Ties are ordered by id.
    pub fn regions_at(&self, position: &Position) -> Vec<Arc<RegionModel>> {
        let mut matches: Vec<Arc<RegionModel>> = self
            .read()
            .values()
            .filter(|region| region.contains(position))
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.id.cmp(&b.id)));
        matches
    }

    /// The region that governs `position`, if any.
    pub fn dominant_at(&self, position: &Position) -> Option<Arc<RegionModel>> {
        self.regions_at(position).into_iter().next()
    }

    pub fn find_by_id(&self, id: &RegionId) -> Option<Arc<RegionModel>> {
        self.read().get(id).cloned()
    }

    /// Every region, ordered by id.
    pub fn all(&self) -> Vec<Arc<RegionModel>> {
        let mut regions: Vec<Arc<RegionModel>> = self.read().values().cloned().collect();
        regions.sort_by(|a, b| a.id.cmp(&b.id));
        regions
    }

    pub fn lineage(&self, id: &RegionId) -> Vec<Arc<RegionModel>> {
        lineage_of(self, id)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Persists a new shape for one region and swaps it into the index.
    ///
    /// Only the shape changes; owners, members, priority and flags keep
    /// their resolved values until the next reload. A definition missing
    /// from the index gets an unresolved runtime model.
    pub async fn update_region(
        &self,
        definition: &RegionDefinition,
        shape: RegionShape,
        nodes: &[Position],
        mode: Option<SelectionMode>,
        actor: &str,
    ) -> Result<(), RepoError> {
        if let Some(artifact) = &definition.artifact {
            let mode = mode.unwrap_or_else(|| SelectionMode::from_shape(&shape));
            self.storage
                .save(artifact, mode, &nodes_or_derived(nodes, &shape))
                .await?;
        }

        {
            let mut regions = self.write();
            let updated = match regions.get(&definition.id) {
                Some(existing) => existing.with_shape(shape),
                None => {
                    tracing::warn!(
                        region_id = %definition.id,
                        "Region not loaded, creating runtime model for shape update"
                    );
                    RegionModel::from_definition(definition.clone(), shape)
                }
            };
            regions.insert(definition.id.clone(), Arc::new(updated));
        }

        tracing::info!(region_id = %definition.id, actor = %actor, "Updated region shape");
        if let Some(invalidator) = self.invalidator() {
            invalidator.invalidate(&definition.id);
        }
        Ok(())
    }

    /// Persists a new shape for an artifact and applies it to every region backed by it.
    ///
    /// Without an explicit mode the stored mode is reused, falling back to
    /// the mode the shape implies. Returns the number of regions updated.
    pub async fn update_artifact(
        &self,
        artifact: &RegionArtifact,
        shape: RegionShape,
        nodes: &[Position],
        mode: Option<SelectionMode>,
        actor: &str,
    ) -> Result<usize, RepoError> {
        let mode = match mode {
            Some(mode) => mode,
            None => self
                .storage
                .load(artifact)
                .await
                .map(|stored| stored.mode)
                .unwrap_or_else(|| SelectionMode::from_shape(&shape)),
        };
        self.storage
            .save(artifact, mode, &nodes_or_derived(nodes, &shape))
            .await?;

        let updated: Vec<RegionId> = {
            let mut regions = self.write();
            let ids: Vec<RegionId> = regions
                .values()
                .filter(|region| region.uses_artifact(artifact))
                .map(|region| region.id.clone())
                .collect();
            for id in &ids {
                if let Some(existing) = regions.get(id) {
                    let replaced = existing.with_shape(shape.clone());
                    regions.insert(id.clone(), Arc::new(replaced));
                }
            }
            ids
        };

        if updated.is_empty() {
            tracing::info!(
                artifact_id = %artifact.id,
                actor = %actor,
                "Persisted shape for artifact (no active regions currently use it)"
            );
        } else {
            tracing::info!(
                artifact_id = %artifact.id,
                actor = %actor,
                regions = updated.len(),
                "Updated shape for regions linked to artifact"
            );
        }

        if let Some(invalidator) = self.invalidator() {
            for id in &updated {
                invalidator.invalidate(id);
            }
        }
        Ok(updated.len())
    }

    fn invalidator(&self) -> Option<Arc<dyn FlagCacheInvalidator>> {
        self.invalidator.get().and_then(Weak::upgrade)
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<RegionId, Arc<RegionModel>>> {
        self.regions.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<RegionId, Arc<RegionModel>>> {
        self.regions.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RegionLookup for RegionRepository {
    fn find_by_id(&self, id: &RegionId) -> Option<Arc<RegionModel>> {
        RegionRepository::find_by_id(self, id)
    }
}

fn nodes_or_derived(nodes: &[Position], shape: &RegionShape) -> Vec<Position> {
    if nodes.is_empty() {
        derive_nodes(shape)
    } else {
        nodes.to_vec()
    }
}

/// Resolves parents before children, memoizing every finished region.
struct HierarchyResolver<'a> {
    pending: &'a HashMap<RegionId, (RegionDefinition, RegionShape)>,
    resolved: HashMap<RegionId, RegionModel>,
    visiting: HashSet<RegionId>,
}

impl<'a> HierarchyResolver<'a> {
    fn new(pending: &'a HashMap<RegionId, (RegionDefinition, RegionShape)>) -> Self {
        Self {
            pending,
            resolved: HashMap::with_capacity(pending.len()),
            visiting: HashSet::new(),
        }
    }

    fn resolve_all(mut self, order: &[RegionId]) -> HashMap<RegionId, Arc<RegionModel>> {
        for id in order {
            self.resolve(id);
        }

        let links: Vec<(RegionId, RegionId)> = self
            .resolved
            .values()
            .filter_map(|region| Some((region.parent_id.clone()?, region.id.clone())))
            .collect();
        for (parent, child) in links {
            if let Some(parent) = self.resolved.get_mut(&parent) {
                parent.children.insert(child);
            }
        }

        self.resolved
            .into_iter()
            .map(|(id, region)| (id, Arc::new(region)))
            .collect()
    }

    fn resolve(&mut self, id: &RegionId) {
        if self.resolved.contains_key(id) {
            return;
        }
        let Some((definition, shape)) = self.pending.get(id) else {
            return;
        };

        self.visiting.insert(id.clone());
        let mut region = RegionModel::from_definition(definition.clone(), shape.clone());

        if let Some(parent_id) = &definition.parent {
            if self.visiting.contains(parent_id) {
                tracing::warn!(
                    region_id = %id,
                    parent_id = %parent_id,
                    "Region parent cycle detected, treating region as a root"
                );
                region.parent_id = None;
            } else if !self.pending.contains_key(parent_id) {
                tracing::warn!(
                    region_id = %id,
                    parent_id = %parent_id,
                    "Region parent not found, treating region as a root"
                );
                region.parent_id = None;
            } else {
                self.resolve(parent_id);
                if let Some(parent) = self.resolved.get(parent_id) {
                    inherit_from(&mut region, parent);
                }
            }
        }

        self.visiting.remove(id);
        self.resolved.insert(id.clone(), region);
    }
}

fn inherit_from(region: &mut RegionModel, parent: &RegionModel) {
    region.owners.extend(parent.owners.iter().cloned());
    region.members.extend(parent.members.iter().cloned());
    region.groups.extend(parent.groups.iter().cloned());
    if region.priority == 0 {
        region.priority = parent.priority;
    }
    region.flags = merge_flags(&parent.flags, &region.definition.flags);
}
