//! Surface de rendu : le buffer BGRA dans lequel le moteur peint.
//!
//! La surface a toujours la taille du widget. Elle est remplacée d'un bloc à
//! chaque redimensionnement ; une peinture dont la taille ne correspond plus
//! est considérée comme périmée et ignorée, la prochaine peinture déclenchée
//! par `was_resized()` aura la bonne taille.

use euclid::default::{Point2D, Rect, Size2D};

use crate::error::SurfaceError;

pub const BYTES_PER_PIXEL: usize = 4;

/// Résultat d'un `blit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlitOutcome {
    Copied,
    /// Dimensions différentes de la surface courante.
    Stale,
    /// Buffer plus court que `width * height * 4`.
    Truncated,
}

#[derive(Debug)]
pub struct RenderSurface {
    size: Size2D<u32>,
    pixels: Vec<u8>,
    /// Le moteur peint avec l'origine en haut à gauche.
    flipped: bool,
    dirty: bool,
    generation: u64,
}

impl RenderSurface {
    /// Surface vide, avant le premier `recreate`.
    pub fn empty() -> Self {
        Self {
            size: Size2D::zero(),
            pixels: Vec::new(),
            flipped: false,
            dirty: false,
            generation: 0,
        }
    }

    pub fn new(size: Size2D<u32>) -> Result<Self, SurfaceError> {
        let mut surface = Self::empty();
        surface.recreate(size)?;
        Ok(surface)
    }

    /// Alloue une nouvelle surface `size`, effacée, en remplacement de l'ancienne.
    ///
    /// En cas d'échec la surface précédente reste intacte.
    pub fn recreate(&mut self, size: Size2D<u32>) -> Result<(), SurfaceError> {
        let (width, height) = (size.width, size.height);
        if width == 0 || height == 0 {
            return Err(SurfaceError::EmptySize { width, height });
        }
        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(BYTES_PER_PIXEL))
            .ok_or(SurfaceError::Overflow { width, height })?;

        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(len)
            .map_err(|source| SurfaceError::Allocation { width, height, source })?;
        pixels.resize(len, 0);

        self.size = size;
        self.pixels = pixels;
        self.flipped = true;
        self.dirty = true;
        self.generation += 1;
        Ok(())
    }

    /// Copie un buffer BGRA fourni par le moteur.
    pub fn blit(&mut self, buffer: &[u8], width: u32, height: u32) -> BlitOutcome {
        if self.is_empty() || width != self.size.width || height != self.size.height {
            return BlitOutcome::Stale;
        }
        let len = self.pixels.len();
        if buffer.len() < len {
            return BlitOutcome::Truncated;
        }
        self.pixels.copy_from_slice(&buffer[..len]);
        self.dirty = true;
        BlitOutcome::Copied
    }

    /// `(0, 0, width, height)` de la surface courante.
    pub fn view_rect(&self) -> Rect<i32> {
        Rect::new(
            Point2D::origin(),
            Size2D::new(self.size.width as i32, self.size.height as i32),
        )
    }

    pub fn size(&self) -> Size2D<u32> {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn is_flipped(&self) -> bool {
        self.flipped
    }

    /// Incrémenté à chaque `recreate`.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Consomme le signal « texture modifiée » destiné au compositeur.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Recopie la surface dans un framebuffer `0x00RRGGBB` (softbuffer).
    ///
    /// Les octets BGRA lus en little-endian donnent directement `0xAARRGGBB` ;
    /// on masque l'alpha. La zone hors surface est remplie de noir.
    pub fn write_xrgb(&self, dst: &mut [u32], dst_width: u32, dst_height: u32) {
        dst.fill(0);
        let dst_width = dst_width as usize;
        let copy_width = self.size.width.min(dst_width as u32) as usize;
        let copy_height = self.size.height.min(dst_height) as usize;
        let src_stride = self.size.width as usize * BYTES_PER_PIXEL;

        for y in 0..copy_height {
            let src_row = &self.pixels[y * src_stride..][..copy_width * BYTES_PER_PIXEL];
            let Some(dst_row) = dst.get_mut(y * dst_width..y * dst_width + copy_width) else {
                return;
            };
            for (out, px) in dst_row.iter_mut().zip(src_row.chunks_exact(BYTES_PER_PIXEL)) {
                *out = u32::from_le_bytes([px[0], px[1], px[2], px[3]]) & 0x00FF_FFFF;
            }
        }
    }
}

impl Default for RenderSurface {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, bgra: [u8; 4]) -> Vec<u8> {
        bgra.repeat((width * height) as usize)
    }

    #[test]
    fn test_recreate_allocates_and_flips() {
        let surface = RenderSurface::new(Size2D::new(4, 3)).unwrap();
        assert_eq!(surface.pixels().len(), 4 * 3 * 4);
        assert!(surface.is_flipped());
        assert!(surface.is_dirty());
        assert_eq!(surface.generation(), 1);
    }

    #[test]
    fn test_recreate_rejects_zero_size() {
        let mut surface = RenderSurface::new(Size2D::new(2, 2)).unwrap();
        let err = surface.recreate(Size2D::new(0, 600)).unwrap_err();
        assert!(matches!(err, SurfaceError::EmptySize { width: 0, height: 600 }));
        // L'ancienne surface est conservée
        assert_eq!(surface.size(), Size2D::new(2, 2));
    }

    #[test]
    fn test_view_rect_tracks_resize() {
        let mut surface = RenderSurface::new(Size2D::new(800, 600)).unwrap();
        assert_eq!(surface.view_rect(), Rect::new(Point2D::origin(), Size2D::new(800, 600)));
        surface.recreate(Size2D::new(1024, 700)).unwrap();
        assert_eq!(surface.view_rect().size, Size2D::new(1024, 700));
        assert_eq!(surface.generation(), 2);
    }

    #[test]
    fn test_blit_copies_matching_frame() {
        let mut surface = RenderSurface::new(Size2D::new(2, 2)).unwrap();
        surface.take_dirty();
        let frame = solid(2, 2, [1, 2, 3, 255]);
        assert_eq!(surface.blit(&frame, 2, 2), BlitOutcome::Copied);
        assert_eq!(surface.pixels(), frame.as_slice());
        assert!(surface.take_dirty());
        assert!(!surface.is_dirty());
    }

    #[test]
    fn test_blit_drops_stale_frame() {
        let mut surface = RenderSurface::new(Size2D::new(2, 2)).unwrap();
        surface.take_dirty();
        let frame = solid(3, 2, [9, 9, 9, 255]);
        assert_eq!(surface.blit(&frame, 3, 2), BlitOutcome::Stale);
        assert!(surface.pixels().iter().all(|b| *b == 0));
        assert!(!surface.is_dirty());
    }

    #[test]
    fn test_blit_drops_short_buffer() {
        let mut surface = RenderSurface::new(Size2D::new(2, 2)).unwrap();
        assert_eq!(surface.blit(&[0; 8], 2, 2), BlitOutcome::Truncated);
    }

    #[test]
    fn test_blit_on_empty_surface_is_stale() {
        let mut surface = RenderSurface::empty();
        assert_eq!(surface.blit(&[], 0, 0), BlitOutcome::Stale);
    }

    #[test]
    fn test_write_xrgb_converts_bgra() {
        let mut surface = RenderSurface::new(Size2D::new(2, 1)).unwrap();
        // bleu, puis rouge
        let frame = [255, 0, 0, 255, 0, 0, 255, 128];
        surface.blit(&frame, 2, 1);

        let mut dst = vec![0xDEAD_BEEF; 3 * 2];
        surface.write_xrgb(&mut dst, 3, 2);
        assert_eq!(dst, vec![0x0000_00FF, 0x00FF_0000, 0, 0, 0, 0]);
    }
}
