//! Member placement.
//!
//! Pure offset arithmetic over already-known member layouts. The resolver
//! turns the result into an emission plan.

use crate::layout::{align_to, TypeLayout};
use crate::target::BitfieldRule;

/// One member to place, in declaration order.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum SlotInput {
    /// Base class or ordinary field.
    Value { layout: TypeLayout },
    /// Bitfield of the given width; `unit` is the layout of its declared
    /// type.
    Bitfield {
        width: u32,
        unit: TypeLayout,
        named: bool,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Placed {
    pub bit_offset: u64,
    /// Storage range the bitfield may share, in bytes (`start..end`).
    /// `None` for values and zero-width bitfields.
    pub unit: Option<(u64, u64)>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Placement {
    pub slots: Vec<Placed>,
    pub size: u64,
    pub align: u64,
}

/// Bits in `bytes` bytes.
fn bits(bytes: u64) -> Option<u64> {
    bytes.checked_mul(8)
}

/// Place struct members sequentially. `None` when an offset or the size
/// overflows.
pub(crate) fn place_struct(
    slots: &[SlotInput],
    rule: BitfieldRule,
    packed: bool,
    explicit_align: Option<u64>,
) -> Option<Placement> {
    let mut placed = Vec::with_capacity(slots.len());
    let mut bit = 0u64;
    let mut align = 1u64;
    // MSVC: the open unit as (start bit, end bit, declared size).
    let mut open: Option<(u64, u64, u64)> = None;

    for slot in slots {
        match *slot {
            SlotInput::Value { layout } => {
                if let Some((_, end, _)) = open.take() {
                    bit = end;
                }
                let a = if packed { 1 } else { layout.align };
                bit = align_to(bit, bits(a)?)?;
                placed.push(Placed {
                    bit_offset: bit,
                    unit: None,
                });
                bit = bit.checked_add(bits(layout.size)?)?;
                align = align.max(a);
            }
            SlotInput::Bitfield { width: 0, unit, .. } => {
                match rule {
                    BitfieldRule::SysV if !packed => bit = align_to(bit, bits(unit.align)?)?,
                    BitfieldRule::SysV => {}
                    BitfieldRule::Msvc => {
                        if let Some((_, end, _)) = open.take() {
                            bit = end;
                        }
                    }
                }
                placed.push(Placed {
                    bit_offset: bit,
                    unit: None,
                });
            }
            SlotInput::Bitfield { width, unit, named } => {
                let width = u64::from(width);
                match rule {
                    BitfieldRule::SysV => {
                        let range = if packed {
                            (bit / 8, bit.checked_add(width)?.div_ceil(8))
                        } else {
                            let align_bits = bits(unit.align)?;
                            let start = bit / align_bits * align_bits;
                            if start.checked_add(bits(unit.size)?)? < bit.checked_add(width)? {
                                bit = align_to(bit, align_bits)?;
                            }
                            let start = bit / align_bits * align_bits / 8;
                            (start, start.checked_add(unit.size)?)
                        };
                        placed.push(Placed {
                            bit_offset: bit,
                            unit: Some(range),
                        });
                        if named && !packed {
                            align = align.max(unit.align);
                        }
                    }
                    BitfieldRule::Msvc => {
                        let reuse = matches!(open, Some((_, end, size))
                            if size == unit.size && bit.saturating_add(width) <= end);
                        if !reuse {
                            if let Some((_, end, _)) = open.take() {
                                bit = end;
                            }
                            let a = if packed { 1 } else { unit.align };
                            let start = align_to(bit, bits(a)?)?;
                            open = Some((start, start.checked_add(bits(unit.size)?)?, unit.size));
                            bit = start;
                            align = align.max(a);
                        }
                        let (start, end) = match open {
                            Some((s, e, _)) => (s, e),
                            None => (bit, bit.checked_add(width)?),
                        };
                        placed.push(Placed {
                            bit_offset: bit,
                            unit: Some((start / 8, end / 8)),
                        });
                    }
                }
                bit = bit.checked_add(width)?;
            }
        }
    }

    if let Some((_, end, _)) = open {
        bit = end;
    }
    if let Some(explicit) = explicit_align {
        align = align.max(explicit);
    }
    Some(Placement {
        slots: placed,
        size: align_to(bit.div_ceil(8), align)?,
        align,
    })
}

/// Place union members, all at offset zero. `None` when the size
/// overflows.
pub(crate) fn place_union(
    slots: &[SlotInput],
    rule: BitfieldRule,
    packed: bool,
    explicit_align: Option<u64>,
) -> Option<Placement> {
    let mut placed = Vec::with_capacity(slots.len());
    let mut size = 0u64;
    let mut align = 1u64;

    for slot in slots {
        match *slot {
            SlotInput::Value { layout } => {
                placed.push(Placed {
                    bit_offset: 0,
                    unit: None,
                });
                size = size.max(layout.size);
                align = align.max(if packed { 1 } else { layout.align });
            }
            SlotInput::Bitfield { width: 0, .. } => placed.push(Placed {
                bit_offset: 0,
                unit: None,
            }),
            SlotInput::Bitfield { width, unit, named } => {
                let a = if packed { 1 } else { unit.align };
                let bytes = match rule {
                    BitfieldRule::Msvc => unit.size,
                    BitfieldRule::SysV => {
                        align_to(u64::from(width).div_ceil(8), a)?.min(unit.size)
                    }
                };
                placed.push(Placed {
                    bit_offset: 0,
                    unit: Some((0, bytes)),
                });
                size = size.max(bytes);
                if named || rule == BitfieldRule::Msvc {
                    align = align.max(a);
                }
            }
        }
    }

    if let Some(explicit) = explicit_align {
        align = align.max(explicit);
    }
    Some(Placement {
        slots: placed,
        size: align_to(size, align)?,
        align,
    })
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
