//! Axis-aligned X/Y extent of a patch.

/// Minimum and maximum X and Y of a patch, in scaled units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    /// The minimum X value.
    pub xmin: f64,
    /// The minimum Y value.
    pub ymin: f64,
    /// The maximum X value.
    pub xmax: f64,
    /// The maximum Y value.
    pub ymax: f64,
}

impl Bounds {
    /// Grows the bounds to include an x/y location.
    ///
    /// # Examples
    ///
    /// ```
    /// use pointcloud::Bounds;
    /// let mut bounds = Bounds::default();
    /// bounds.grow(1., 2.);
    /// assert_eq!(1., bounds.xmin);
    /// assert_eq!(2., bounds.ymax);
    /// ```
    pub fn grow(&mut self, x: f64, y: f64) {
        if x < self.xmin {
            self.xmin = x;
        }
        if y < self.ymin {
            self.ymin = y;
        }
        if x > self.xmax {
            self.xmax = x;
        }
        if y > self.ymax {
            self.ymax = y;
        }
    }

    /// Grows the bounds to include another bounds.
    pub fn merge(&mut self, other: &Bounds) {
        if other.xmin < self.xmin {
            self.xmin = other.xmin;
        }
        if other.ymin < self.ymin {
            self.ymin = other.ymin;
        }
        if other.xmax > self.xmax {
            self.xmax = other.xmax;
        }
        if other.ymax > self.ymax {
            self.ymax = other.ymax;
        }
    }

    /// Do these bounds share any area with another bounds?
    ///
    /// # Examples
    ///
    /// ```
    /// use pointcloud::Bounds;
    /// let a = Bounds { xmin: 0., ymin: 0., xmax: 2., ymax: 2. };
    /// let b = Bounds { xmin: 1., ymin: 1., xmax: 3., ymax: 3. };
    /// let c = Bounds { xmin: 5., ymin: 5., xmax: 6., ymax: 6. };
    /// assert!(a.intersects(&b));
    /// assert!(!a.intersects(&c));
    /// ```
    pub fn intersects(&self, other: &Bounds) -> bool {
        !(self.xmin > other.xmax
            || self.xmax < other.xmin
            || self.ymin > other.ymax
            || self.ymax < other.ymin)
    }
}

impl Default for Bounds {
    fn default() -> Bounds {
        Bounds {
            xmin: f64::INFINITY,
            ymin: f64::INFINITY,
            xmax: f64::NEG_INFINITY,
            ymax: f64::NEG_INFINITY,
        }
    }
}
