//! Measurement session: per-image state and the interaction state machine.
//!
//! A [`Session`] owns an ordered collection of [`ImageRecord`]s, one per
//! imported photo, and tracks which one is active. Each record keeps its
//! own calibration, region set and results; nothing is shared between
//! images except the session-wide HSL range.
//!
//! User input arrives through explicit operations ([`Session::click`],
//! [`Session::close_region`], [`Session::commit_calibration`], ...)
//! interpreted according to the current [`Mode`]. Any edit to an image's
//! regions or calibration marks it [`Status::Pending`] until
//! [`Session::compute_areas`] runs again.

use crate::calibration::{self, Calibration, CalibrationPoints};
use crate::color::HslRange;
use crate::region;
use crate::segment;
use crate::types::{
    AreaResult, Dimensions, ImageId, MeasureError, PixelWindow, Point, Polygon, RgbaImage,
    SessionConfig,
};

/// What a click on the image means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Clicks are ignored (pan/zoom belongs to the UI).
    #[default]
    Viewing,
    /// Clicks mark calibration endpoints.
    Calibrating,
    /// Clicks add vertices to the region draft.
    DrawingRegion,
    /// HSL bands are being tuned against the live preview.
    AdjustingColor,
}

/// Whether an image's results reflect its current regions and calibration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    /// Results are missing or stale.
    #[default]
    Pending,
    /// Results were computed from the current regions and calibration.
    Ready,
}

/// Effect of a [`Session::click`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// A calibration endpoint was recorded; holds the number now marked.
    CalibrationPoint(usize),
    /// A vertex was appended to the draft; holds the draft length.
    DraftPoint(usize),
    /// The click snapped to the draft's first vertex and closed a region;
    /// holds the new region's 1-based id.
    RegionClosed(usize),
    /// The current mode does not react to clicks.
    Ignored,
}

/// Everything the session knows about one image.
#[derive(Debug, Clone)]
pub struct ImageRecord {
    id: ImageId,
    name: String,
    dimensions: Dimensions,
    calibration: Option<Calibration>,
    calibration_points: CalibrationPoints,
    regions: Vec<Polygon>,
    measured_range: Option<HslRange>,
    results: Vec<AreaResult>,
    status: Status,
}

impl ImageRecord {
    /// A fresh record with no calibration, regions or results.
    #[must_use]
    pub fn new(name: impl Into<String>, dimensions: Dimensions) -> Self {
        Self {
            id: ImageId::new(),
            name: name.into(),
            dimensions,
            calibration: None,
            calibration_points: CalibrationPoints::Empty,
            regions: Vec::new(),
            measured_range: None,
            results: Vec::new(),
            status: Status::Pending,
        }
    }

    /// Identity within the session.
    #[must_use]
    pub const fn id(&self) -> ImageId {
        self.id
    }

    /// File name the image was imported from.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pixel dimensions of the decoded image.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// The confirmed calibration, if any.
    #[must_use]
    pub const fn calibration(&self) -> Option<&Calibration> {
        self.calibration.as_ref()
    }

    /// The endpoints the current calibration was committed from.
    #[must_use]
    pub const fn calibration_points(&self) -> CalibrationPoints {
        self.calibration_points
    }

    /// Closed regions in creation order.
    #[must_use]
    pub fn regions(&self) -> &[Polygon] {
        &self.regions
    }

    /// Results of the last computation, one per region in region order.
    ///
    /// May be stale; check [`status`](Self::status).
    #[must_use]
    pub fn results(&self) -> &[AreaResult] {
        &self.results
    }

    /// The HSL range used by the last computation.
    #[must_use]
    pub const fn measured_range(&self) -> Option<&HslRange> {
        self.measured_range.as_ref()
    }

    /// Whether results reflect the current regions and calibration.
    #[must_use]
    pub const fn status(&self) -> Status {
        self.status
    }

    /// Whether results are ready and were computed with `range`.
    #[must_use]
    pub fn is_current(&self, range: &HslRange) -> bool {
        self.status == Status::Ready && self.measured_range.as_ref() == Some(range)
    }

    /// Sum of all region areas of the last computation.
    #[must_use]
    pub fn total_area(&self) -> f64 {
        self.results.iter().map(|r| r.area).sum()
    }

    /// Replace the calibration. Invalidates results.
    pub fn set_calibration(&mut self, calibration: Calibration, points: CalibrationPoints) {
        self.calibration = Some(calibration);
        self.calibration_points = points;
        self.status = Status::Pending;
    }

    /// Append a closed region and return its 1-based id. Invalidates results.
    pub fn push_region(&mut self, polygon: Polygon) -> usize {
        self.regions.push(polygon);
        self.status = Status::Pending;
        self.regions.len()
    }

    /// Drop every region together with the results computed from them.
    pub fn clear_regions(&mut self) {
        self.regions.clear();
        self.results.clear();
        self.measured_range = None;
        self.status = Status::Pending;
    }

    /// Measure every region against `range` in the given pixel buffer.
    ///
    /// Each region is rasterized on its own over the full image, its
    /// matching pixels counted, and the count converted with the
    /// calibration ratio. The previous results are replaced wholesale and
    /// the record becomes [`Status::Ready`]. Running it again with the
    /// same inputs yields identical results.
    ///
    /// # Errors
    ///
    /// Returns [`MeasureError::Uncalibrated`] without a calibration,
    /// [`MeasureError::NoRegions`] without regions, and
    /// [`MeasureError::DimensionMismatch`] if `image` is not the buffer
    /// this record was created for. The record is unchanged on error.
    pub fn compute_areas(
        &mut self,
        image: &RgbaImage,
        range: &HslRange,
    ) -> Result<&[AreaResult], MeasureError> {
        let calibration = self.calibration.ok_or(MeasureError::Uncalibrated)?;
        if self.regions.is_empty() {
            return Err(MeasureError::NoRegions);
        }
        let actual = Dimensions::of(image);
        if actual != self.dimensions {
            return Err(MeasureError::DimensionMismatch {
                expected: self.dimensions,
                actual,
            });
        }

        let full = PixelWindow::full(self.dimensions);
        let results: Vec<AreaResult> = self
            .regions
            .iter()
            .enumerate()
            .map(|(index, polygon)| {
                let mask = region::rasterize(std::slice::from_ref(polygon), full);
                let pixel_count = segment::count_matches(image, &mask, range);
                let area = calibration.area_from_pixels(pixel_count);
                log::debug!(
                    "{}: region {} has {pixel_count} matching of {} pixels, area {area:.4}",
                    self.name,
                    index + 1,
                    mask.included_count(),
                );
                AreaResult {
                    region_id: index + 1,
                    pixel_count,
                    area,
                }
            })
            .collect();

        self.results = results;
        self.measured_range = Some(*range);
        self.status = Status::Ready;
        log::info!(
            "{}: measured {} regions, total area {:.2}",
            self.name,
            self.results.len(),
            self.total_area(),
        );
        Ok(&self.results)
    }
}

/// All images of a measuring session plus the interaction state.
#[derive(Debug, Clone)]
pub struct Session {
    config: SessionConfig,
    images: Vec<ImageRecord>,
    active: Option<ImageId>,
    mode: Mode,
    range: HslRange,
    calibration_points: CalibrationPoints,
    draft: Vec<Point>,
    view_scale: f64,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl Session {
    /// An empty session. The HSL range starts at `config.range`.
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self {
            range: config.range,
            config,
            images: Vec::new(),
            active: None,
            mode: Mode::Viewing,
            calibration_points: CalibrationPoints::Empty,
            draft: Vec::new(),
            view_scale: 1.0,
        }
    }

    /// Session settings.
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    // ───────────────────────── Images ─────────────────────────

    /// Register a decoded image. The first image added becomes active.
    pub fn add_image(&mut self, name: impl Into<String>, dimensions: Dimensions) -> ImageId {
        let record = ImageRecord::new(name, dimensions);
        let id = record.id();
        log::debug!("added image {} ({dimensions}) as {id}", record.name());
        self.images.push(record);
        if self.active.is_none() {
            self.activate(id);
        }
        id
    }

    /// Remove an image and everything measured on it.
    ///
    /// Removing the active image leaves the session with no selection.
    ///
    /// # Errors
    ///
    /// Returns [`MeasureError::UnknownImage`] if `id` is not in the session.
    pub fn remove_image(&mut self, id: ImageId) -> Result<(), MeasureError> {
        let index = self
            .images
            .iter()
            .position(|img| img.id() == id)
            .ok_or(MeasureError::UnknownImage(id))?;
        self.images.remove(index);
        if self.active == Some(id) {
            self.active = None;
            self.mode = Mode::Viewing;
            self.calibration_points = CalibrationPoints::Empty;
            self.draft.clear();
        }
        Ok(())
    }

    /// Make `id` the active image.
    ///
    /// Discards the region draft and restores the image's saved
    /// calibration points.
    ///
    /// # Errors
    ///
    /// Returns [`MeasureError::UnknownImage`] if `id` is not in the session.
    pub fn select(&mut self, id: ImageId) -> Result<(), MeasureError> {
        if self.image(id).is_none() {
            return Err(MeasureError::UnknownImage(id));
        }
        self.activate(id);
        Ok(())
    }

    fn activate(&mut self, id: ImageId) {
        self.active = Some(id);
        self.draft.clear();
        self.calibration_points = self
            .image(id)
            .map_or(CalibrationPoints::Empty, ImageRecord::calibration_points);
    }

    /// Look up an image.
    #[must_use]
    pub fn image(&self, id: ImageId) -> Option<&ImageRecord> {
        self.images.iter().find(|img| img.id() == id)
    }

    /// All images in import order.
    #[must_use]
    pub fn images(&self) -> &[ImageRecord] {
        &self.images
    }

    /// The active image, if any.
    #[must_use]
    pub fn active(&self) -> Option<&ImageRecord> {
        self.active.and_then(|id| self.image(id))
    }

    fn active_mut(&mut self) -> Result<&mut ImageRecord, MeasureError> {
        let id = self.active.ok_or(MeasureError::NoActiveImage)?;
        self.images
            .iter_mut()
            .find(|img| img.id() == id)
            .ok_or(MeasureError::NoActiveImage)
    }

    // ───────────────────────── Interaction ─────────────────────────

    /// Current interaction mode.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Switch interaction mode.
    ///
    /// [`Mode::Viewing`] is always available. The others need an active
    /// image; [`Mode::DrawingRegion`] additionally needs a calibration and
    /// [`Mode::AdjustingColor`] a calibration and at least one region.
    ///
    /// # Errors
    ///
    /// Returns [`MeasureError::NoActiveImage`] or
    /// [`MeasureError::ModeUnavailable`]; the mode is unchanged.
    pub fn set_mode(&mut self, mode: Mode) -> Result<(), MeasureError> {
        if mode != Mode::Viewing {
            let image = self.active().ok_or(MeasureError::NoActiveImage)?;
            let calibrated = image.calibration().is_some();
            let available = match mode {
                Mode::Viewing | Mode::Calibrating => true,
                Mode::DrawingRegion => calibrated,
                Mode::AdjustingColor => calibrated && !image.regions().is_empty(),
            };
            if !available {
                return Err(MeasureError::ModeUnavailable(mode));
            }
        }
        self.mode = mode;
        Ok(())
    }

    /// Current view scale (screen pixels per image pixel).
    #[must_use]
    pub const fn view_scale(&self) -> f64 {
        self.view_scale
    }

    /// Update the view scale used to convert the close tolerance into
    /// image pixels. Non-finite or non-positive values are ignored.
    pub fn set_view_scale(&mut self, scale: f64) {
        if scale.is_finite() && scale > 0.0 {
            self.view_scale = scale;
        }
    }

    /// The click-to-close radius in image pixels at the current scale.
    #[must_use]
    pub fn close_tolerance(&self) -> f64 {
        self.config.close_tolerance_px / self.view_scale
    }

    /// Calibration endpoints marked so far.
    #[must_use]
    pub const fn calibration_points(&self) -> CalibrationPoints {
        self.calibration_points
    }

    /// Vertices of the region being drawn.
    #[must_use]
    pub fn draft(&self) -> &[Point] {
        &self.draft
    }

    /// Handle a click at `point` (image coordinates).
    ///
    /// # Errors
    ///
    /// Returns [`MeasureError::NoActiveImage`] if a click that closes a
    /// region arrives with no active image.
    pub fn click(&mut self, point: Point) -> Result<ClickOutcome, MeasureError> {
        match self.mode {
            Mode::Calibrating => {
                self.calibration_points.start_or_continue(point);
                Ok(ClickOutcome::CalibrationPoint(self.calibration_points.len()))
            }
            Mode::DrawingRegion => {
                let snaps = self.draft.len() >= Polygon::MIN_VERTICES
                    && self.draft[0].distance(point) < self.close_tolerance();
                if snaps {
                    return self.close_region().map(ClickOutcome::RegionClosed);
                }
                self.draft.push(point);
                Ok(ClickOutcome::DraftPoint(self.draft.len()))
            }
            Mode::Viewing | Mode::AdjustingColor => Ok(ClickOutcome::Ignored),
        }
    }

    /// Close the draft into a region of the active image.
    ///
    /// Returns the new region's 1-based id.
    ///
    /// # Errors
    ///
    /// Returns [`MeasureError::DraftPolygon`] if the draft has fewer than
    /// three vertices; the draft is kept so drawing can continue.
    /// Returns [`MeasureError::NoActiveImage`] without an active image.
    pub fn close_region(&mut self) -> Result<usize, MeasureError> {
        if self.draft.len() < Polygon::MIN_VERTICES {
            log::warn!(
                "region close rejected: {} of {} points",
                self.draft.len(),
                Polygon::MIN_VERTICES
            );
            return Err(MeasureError::DraftPolygon {
                vertices: self.draft.len(),
            });
        }
        let polygon = Polygon::new(self.draft.clone())?;
        let id = self.active_mut()?.push_region(polygon);
        self.draft.clear();
        Ok(id)
    }

    /// Add a complete outline to the active image, bypassing the draft.
    ///
    /// For outlines that come from a file rather than from clicks. The
    /// draft and the mode are left alone.
    ///
    /// # Errors
    ///
    /// Returns [`MeasureError::DraftPolygon`] for fewer than three points
    /// or [`MeasureError::NoActiveImage`] without an active image.
    pub fn add_region(&mut self, points: Vec<Point>) -> Result<usize, MeasureError> {
        let polygon = Polygon::new(points)?;
        Ok(self.active_mut()?.push_region(polygon))
    }

    /// Remove every region and the draft from the active image.
    ///
    /// Leaves [`Mode::AdjustingColor`] for [`Mode::Viewing`], since that
    /// mode needs at least one region.
    ///
    /// # Errors
    ///
    /// Returns [`MeasureError::NoActiveImage`] without an active image.
    pub fn clear_regions(&mut self) -> Result<(), MeasureError> {
        self.active_mut()?.clear_regions();
        self.draft.clear();
        if self.mode == Mode::AdjustingColor {
            self.mode = Mode::Viewing;
        }
        Ok(())
    }

    /// Confirm the marked calibration endpoints with a real distance.
    ///
    /// On success the active image's calibration is replaced and the mode
    /// returns to [`Mode::Viewing`].
    ///
    /// # Errors
    ///
    /// Returns [`MeasureError::InvalidCalibration`] (see
    /// [`calibration::commit`]) or [`MeasureError::NoActiveImage`]. Nothing
    /// changes on error, including the mode.
    pub fn commit_calibration(&mut self, real_distance: f64) -> Result<Calibration, MeasureError> {
        let points = self.calibration_points;
        let calibration = calibration::commit(&points, real_distance)?;
        let image = self.active_mut()?;
        image.set_calibration(calibration, points);
        log::info!(
            "{}: calibrated {:.2} px over {} units ({:.4} px/unit)",
            image.name(),
            calibration.pixel_distance(),
            calibration.real_distance(),
            calibration.ratio(),
        );
        self.mode = Mode::Viewing;
        Ok(calibration)
    }

    // ───────────────────────── Colour range ─────────────────────────

    /// The session-wide HSL acceptance range.
    #[must_use]
    pub const fn range(&self) -> &HslRange {
        &self.range
    }

    /// Mutable access for slider-style updates.
    pub const fn range_mut(&mut self) -> &mut HslRange {
        &mut self.range
    }

    /// Replace the HSL range.
    pub const fn set_range(&mut self, range: HslRange) {
        self.range = range;
    }

    // ───────────────────────── Measurement ─────────────────────────

    /// Compute areas for the active image with the session range.
    ///
    /// Returns to [`Mode::Viewing`] on success.
    ///
    /// # Errors
    ///
    /// See [`ImageRecord::compute_areas`]; also
    /// [`MeasureError::NoActiveImage`].
    pub fn compute_areas(&mut self, image: &RgbaImage) -> Result<Vec<AreaResult>, MeasureError> {
        let range = self.range;
        let results = self.active_mut()?.compute_areas(image, &range)?.to_vec();
        self.mode = Mode::Viewing;
        Ok(results)
    }

    /// Highlight matching pixels inside the active image's regions.
    ///
    /// Only the regions' bounding window is scanned. Returns the number of
    /// highlighted pixels (zero when there are no regions).
    ///
    /// # Errors
    ///
    /// Returns [`MeasureError::NoActiveImage`] or
    /// [`MeasureError::DimensionMismatch`].
    pub fn preview(&self, image: &mut RgbaImage) -> Result<u64, MeasureError> {
        let record = self.active().ok_or(MeasureError::NoActiveImage)?;
        let actual = Dimensions::of(image);
        if actual != record.dimensions() {
            return Err(MeasureError::DimensionMismatch {
                expected: record.dimensions(),
                actual,
            });
        }
        if record.regions().is_empty() {
            return Ok(0);
        }
        let (_, highlighted) =
            segment::preview_regions(image, record.regions(), &self.range, self.config.highlight);
        Ok(highlighted)
    }
}
