//! Short-horizon track association.
//!
//! The tracker matches each frame's detection centroids against the
//! centroids of live tracks by greedy nearest-neighbour assignment over
//! Manhattan distance. Track IDs stay stable while a track lives, so
//! per-track state (the alerted set, displacement history) survives
//! detector output reordering between frames.
//!
//! This is deliberately short-horizon: no motion model, no appearance
//! features, no re-identification. A track that goes unmatched for more
//! than `max_missed` consecutive frames is retired and its ID is never
//! reused within the run.

/// Tunables for track association.
#[derive(Clone, Debug)]
pub struct TrackerConfig {
    /// Maximum Manhattan distance at which a detection can join an
    /// existing track. Must stay comfortably above the alert trigger,
    /// otherwise alert-worthy jumps would register as new tracks.
    pub match_radius: f32,
    /// Consecutive unmatched frames before a track is retired.
    pub max_missed: u32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            match_radius: 150.0,
            max_missed: 5,
        }
    }
}

/// One live track.
#[derive(Clone, Debug)]
pub struct Track {
    pub id: u64,
    pub centroid: (f32, f32),
    /// Consecutive frames without a match.
    pub missed: u32,
    /// Frames in which this track was observed.
    pub updates: u64,
}

/// Outcome of matching one observed centroid.
#[derive(Clone, Copy, Debug)]
pub struct TrackObservation {
    pub track_id: u64,
    pub centroid: (f32, f32),
    /// Manhattan distance moved since the previous frame.
    /// `None` when the track was created by this observation.
    pub displacement: Option<f32>,
}

/// Greedy nearest-centroid tracker.
pub struct Tracker {
    config: TrackerConfig,
    tracks: Vec<Track>,
    next_id: u64,
}

impl Tracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            tracks: Vec::new(),
            next_id: 0,
        }
    }

    /// Match observed centroids against live tracks.
    ///
    /// Pairs are assigned globally closest first; each track and each
    /// centroid matches at most once, and only within `match_radius`.
    /// Unmatched centroids start new tracks. The returned observations
    /// are in input order.
    pub fn observe(&mut self, centroids: &[(f32, f32)]) -> Vec<TrackObservation> {
        let mut pairs: Vec<(f32, usize, usize)> = Vec::new();
        for (track_idx, track) in self.tracks.iter().enumerate() {
            for (centroid_idx, &centroid) in centroids.iter().enumerate() {
                let distance = manhattan(track.centroid, centroid);
                if distance <= self.config.match_radius {
                    pairs.push((distance, track_idx, centroid_idx));
                }
            }
        }
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut track_taken = vec![false; self.tracks.len()];
        let mut matched: Vec<Option<(u64, f32)>> = vec![None; centroids.len()];
        for (distance, track_idx, centroid_idx) in pairs {
            if track_taken[track_idx] || matched[centroid_idx].is_some() {
                continue;
            }
            track_taken[track_idx] = true;
            let track = &mut self.tracks[track_idx];
            track.centroid = centroids[centroid_idx];
            track.missed = 0;
            track.updates += 1;
            matched[centroid_idx] = Some((track.id, distance));
        }

        for (track_idx, track) in self.tracks.iter_mut().enumerate() {
            if !track_taken[track_idx] {
                track.missed += 1;
            }
        }
        let max_missed = self.config.max_missed;
        self.tracks.retain(|track| track.missed <= max_missed);

        let mut observations = Vec::with_capacity(centroids.len());
        for (centroid_idx, &centroid) in centroids.iter().enumerate() {
            match matched[centroid_idx] {
                Some((track_id, displacement)) => observations.push(TrackObservation {
                    track_id,
                    centroid,
                    displacement: Some(displacement),
                }),
                None => {
                    let track_id = self.next_id;
                    self.next_id += 1;
                    self.tracks.push(Track {
                        id: track_id,
                        centroid,
                        missed: 0,
                        updates: 1,
                    });
                    observations.push(TrackObservation {
                        track_id,
                        centroid,
                        displacement: None,
                    });
                }
            }
        }
        observations
    }

    pub fn live_tracks(&self) -> &[Track] {
        &self.tracks
    }
}

/// Manhattan distance between two points.
pub fn manhattan(a: (f32, f32), b: (f32, f32)) -> f32 {
    (a.0 - b.0).abs() + (a.1 - b.1).abs()
}
