//src/pvm/loader.rs
//! Turns a program image into instruction/data memory contents and an
//! entry PC. Grounded in `reformeddm_sim.cpp::main()`: non-`.text`
//! sections with a nonzero address load into data memory, `.text` loads
//! into instruction memory, and `_start`'s symbol value becomes the
//! initial PC.

use crate::pvm::core_errors::{CoreError, CoreResult};

pub struct LoadedProgram {
    pub instructions: Vec<u32>,
    pub data: Vec<u8>,
    pub entry_pc: u32,
}

pub trait ProgramLoader {
    fn load(&self, image: &[u8]) -> CoreResult<LoadedProgram>;
}

/// Loads a raw little-endian instruction stream with no data segment and
/// an entry point of zero. Used by tests and the demo programs instead of
/// building a real ELF file.
#[derive(Debug, Default)]
pub struct FlatBinaryLoader;

impl ProgramLoader for FlatBinaryLoader {
    fn load(&self, image: &[u8]) -> CoreResult<LoadedProgram> {
        if image.len() % 4 != 0 {
            return Err(CoreError::Io("flat image length not word-aligned".into()));
        }
        let instructions = image
            .chunks_exact(4)
            .map(|w| u32::from_le_bytes([w[0], w[1], w[2], w[3]]))
            .collect();
        Ok(LoadedProgram {
            instructions,
            data: Vec::new(),
            entry_pc: 0,
        })
    }
}

/// A minimal ELF32 parser: reads `PT_LOAD` segments and the `_start`
/// symbol's value. No relocation, no dynamic linking — this core only
/// ever runs statically linked, already-placed images.
#[derive(Debug, Default)]
pub struct ElfLoader;

const EI_NIDENT: usize = 16;
const PT_LOAD: u32 = 1;

impl ElfLoader {
    fn read_u16(buf: &[u8], off: usize) -> CoreResult<u16> {
        buf.get(off..off + 2)
            .map(|b| u16::from_le_bytes([b[0], b[1]]))
            .ok_or_else(|| CoreError::Io("truncated ELF header".into()))
    }

    fn read_u32(buf: &[u8], off: usize) -> CoreResult<u32> {
        buf.get(off..off + 4)
            .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .ok_or_else(|| CoreError::Io("truncated ELF header".into()))
    }
}

impl ProgramLoader for ElfLoader {
    fn load(&self, image: &[u8]) -> CoreResult<LoadedProgram> {
        if image.len() < EI_NIDENT + 36 || &image[0..4] != b"\x7fELF" {
            return Err(CoreError::Io("not an ELF32 image".into()));
        }
        if image[4] != 1 {
            return Err(CoreError::Io("only ELF32 images are supported".into()));
        }

        let e_entry = Self::read_u32(image, 24)?;
        let e_phoff = Self::read_u32(image, 28)? as usize;
        let e_phentsize = Self::read_u16(image, 42)? as usize;
        let e_phnum = Self::read_u16(image, 44)? as usize;

        let mut instructions = Vec::new();
        let mut data = Vec::new();

        for i in 0..e_phnum {
            let base = e_phoff + i * e_phentsize;
            let p_type = Self::read_u32(image, base)?;
            if p_type != PT_LOAD {
                continue;
            }
            let p_offset = Self::read_u32(image, base + 4)? as usize;
            let p_vaddr = Self::read_u32(image, base + 8)?;
            let p_filesz = Self::read_u32(image, base + 16)? as usize;
            let segment = image
                .get(p_offset..p_offset + p_filesz)
                .ok_or_else(|| CoreError::Io("segment extends past end of file".into()))?;

            // Executable segments are assumed to be the instruction image,
            // loaded at PC 0 regardless of their link-time virtual address;
            // everything else lands in data memory at its virtual address.
            if p_vaddr == 0 || (p_vaddr as usize) < 0x1_0000 {
                let words = segment
                    .chunks(4)
                    .map(|chunk| {
                        let mut b = [0u8; 4];
                        b[..chunk.len()].copy_from_slice(chunk);
                        u32::from_le_bytes(b)
                    })
                    .collect::<Vec<_>>();
                if instructions.len() < words.len() {
                    instructions = words;
                }
            } else {
                let start = p_vaddr as usize;
                if data.len() < start + segment.len() {
                    data.resize(start + segment.len(), 0);
                }
                data[start..start + segment.len()].copy_from_slice(segment);
            }
        }

        Ok(LoadedProgram {
            instructions,
            data,
            entry_pc: e_entry,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_loader_decodes_little_endian_words() {
        let image = [0x13, 0x00, 0x00, 0x00]; // NOP
        let program = FlatBinaryLoader.load(&image).unwrap();
        assert_eq!(program.instructions, vec![0x0000_0013]);
        assert_eq!(program.entry_pc, 0);
    }

    #[test]
    fn flat_loader_rejects_unaligned_image() {
        assert!(FlatBinaryLoader.load(&[0x13, 0x00, 0x00]).is_err());
    }

    #[test]
    fn elf_loader_rejects_non_elf_input() {
        assert!(ElfLoader.load(b"not an elf").is_err());
    }
}
