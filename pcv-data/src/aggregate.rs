//! Multi-source aggregation.

use crate::config::SourceConfig;
use crate::error::LoadError;
use crate::loader::{FileLoader, SourceReader};
use crate::selection::{Selection, describe};
use crate::types::Point;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};

/// What one source contributed once fully read.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSummary {
    /// 1-based position of the source in the configuration.
    pub index: usize,
    pub path: PathBuf,
    pub points: usize,
}

/// Ordered set of sources to ingest.
#[derive(Debug, Clone)]
pub struct Aggregator {
    configs: Vec<SourceConfig>,
    selected: Vec<usize>,
}

impl Aggregator {
    /// Aggregate every configured source.
    pub fn new(configs: Vec<SourceConfig>) -> Self {
        let selected = (0..configs.len()).collect();
        Self { configs, selected }
    }

    /// Restrict ingestion to a selection of 1-based indices.
    ///
    /// Spans past the last source are dropped with a single warning.
    pub fn with_selection(mut self, selection: Option<&Selection>) -> Self {
        let Some(selection) = selection else {
            self.selected = (0..self.configs.len()).collect();
            return self;
        };

        let (kept, dropped) = selection.resolve(self.configs.len());
        if !dropped.is_empty() {
            warn!("Omitted invalid values for --only : {}", describe(&dropped));
        }
        debug!("Selected sources {}", selection);
        self.selected = kept.into_iter().map(|i| i - 1).collect();
        self
    }

    /// Selected sources, in declared order.
    pub fn sources(&self) -> impl Iterator<Item = &SourceConfig> + '_ {
        self.selected.iter().map(|&i| &self.configs[i])
    }

    /// Number of selected sources.
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Lazily concatenate the points of every selected source.
    pub fn points<'a>(&'a self, loader: &'a FileLoader) -> Points<'a> {
        Points {
            loader,
            sources: Box::new(self.selected.iter().map(|&i| (i + 1, &self.configs[i]))),
            current: None,
            on_source: None,
            done: false,
        }
    }

    /// Read every selected source into memory.
    ///
    /// `on_source` is called after each source is exhausted.
    pub fn collect_with<F>(&self, loader: &FileLoader, mut on_source: F) -> Result<Vec<Point>, LoadError>
    where
        F: FnMut(&SourceSummary),
    {
        let start = Instant::now();
        let mut lazy = self.points(loader);
        lazy.on_source = Some(&mut on_source);
        let points = lazy.collect::<Result<Vec<_>, _>>()?;

        info!(
            "Parsed {} points in {:.3} s",
            points.len(),
            start.elapsed().as_secs_f64()
        );
        Ok(points)
    }

    /// Read every selected source into memory.
    pub fn collect(&self, loader: &FileLoader) -> Result<Vec<Point>, LoadError> {
        self.collect_with(loader, |_| {})
    }
}

/// Lazy concatenation of several sources. Stops at the first error.
pub struct Points<'a> {
    loader: &'a FileLoader,
    sources: Box<dyn Iterator<Item = (usize, &'a SourceConfig)> + 'a>,
    current: Option<(usize, SourceReader)>,
    on_source: Option<&'a mut dyn FnMut(&SourceSummary)>,
    done: bool,
}

impl Iterator for Points<'_> {
    type Item = Result<Point, LoadError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            if let Some((index, reader)) = self.current.as_mut() {
                match reader.next() {
                    Some(Ok(point)) => return Some(Ok(point)),
                    Some(Err(e)) => {
                        self.done = true;
                        return Some(Err(e));
                    }
                    None => {
                        let summary = SourceSummary {
                            index: *index,
                            path: reader.path().to_path_buf(),
                            points: reader.points_read(),
                        };
                        self.current = None;
                        if let Some(on_source) = self.on_source.as_deref_mut() {
                            on_source(&summary);
                        }
                    }
                }
            }

            let Some((index, config)) = self.sources.next() else {
                self.done = true;
                break;
            };
            match self.loader.load(config) {
                Ok(reader) => self.current = Some((index, reader)),
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configs(n: usize) -> Vec<SourceConfig> {
        (1..=n).map(|i| SourceConfig::new(format!("source_{i}.csv"))).collect()
    }

    fn paths(aggregator: &Aggregator) -> Vec<String> {
        aggregator
            .sources()
            .map(|c| c.file_path.display().to_string())
            .collect()
    }

    #[test]
    fn test_all_sources_by_default() {
        let aggregator = Aggregator::new(configs(3));
        assert_eq!(aggregator.len(), 3);
        assert_eq!(paths(&aggregator), ["source_1.csv", "source_2.csv", "source_3.csv"]);
    }

    #[test]
    fn test_selection_keeps_declared_order() {
        let selection: Selection = "4,<=2".parse().unwrap();
        let aggregator = Aggregator::new(configs(5)).with_selection(Some(&selection));
        assert_eq!(paths(&aggregator), ["source_1.csv", "source_2.csv", "source_4.csv"]);
    }

    #[test]
    fn test_out_of_range_indices_are_dropped() {
        let selection: Selection = "2,7-9".parse().unwrap();
        let aggregator = Aggregator::new(configs(3)).with_selection(Some(&selection));
        assert_eq!(paths(&aggregator), ["source_2.csv"]);

        let selection: Selection = "9".parse().unwrap();
        let aggregator = Aggregator::new(configs(3)).with_selection(Some(&selection));
        assert!(aggregator.is_empty());
    }

    #[test]
    fn test_unbounded_range_is_clamped_to_sources() {
        let selection: Selection = "1-18446744073709551615".parse().unwrap();
        let aggregator = Aggregator::new(configs(3)).with_selection(Some(&selection));
        assert_eq!(paths(&aggregator), ["source_1.csv", "source_2.csv", "source_3.csv"]);
    }

    #[test]
    fn test_missing_sources_aggregate_to_nothing() {
        let aggregator = Aggregator::new(configs(2));
        let loader = FileLoader::new();
        assert_eq!(aggregator.points(&loader).count(), 0);

        let mut seen = Vec::new();
        let points = aggregator
            .collect_with(&loader, |summary| seen.push(summary.index))
            .unwrap();
        assert!(points.is_empty());
        assert_eq!(seen, vec![1, 2]);
    }
}
