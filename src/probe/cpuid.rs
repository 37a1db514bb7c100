use crate::probe::{ProbeSource, TopologyProbe};
use crate::util::fs::SysfsAccess;

/// CPUID leaf 1, EDX bit 28: the package may hold more than one logical processor
const HTT_FLAG: u32 = 1 << 28;

/// Falls back to the processor identification instruction when sysfs has no sibling list
///
/// Only x86 processors expose the needed information; other architectures report the probe as
/// unavailable. The instruction runs on whichever cpu the daemon happens to be scheduled on, so
/// the figure is assumed to hold for every package.
#[derive(Debug, Clone)]
pub struct InstructionProbe;

/// Logical processors per package from CPUID leaf 1 registers
///
/// EBX bits 23..16 hold the count, valid only when the HTT flag is set in EDX. A zero count is
/// treated as 1.
pub fn decode_logical_count(ebx: u32, edx: u32) -> usize {
	if edx & HTT_FLAG == 0 {
		return 1;
	}
	let count = ((ebx >> 16) & 0xFF) as usize;
	count.max(1)
}

#[cfg(target_arch = "x86_64")]
#[allow(unused_unsafe)]
fn read_leaf1() -> Option<(u32, u32)> {
	// SAFETY: CPUID is available on every x86_64 processor.
	let leaf = unsafe { std::arch::x86_64::__cpuid(1) };
	Some((leaf.ebx, leaf.edx))
}

#[cfg(target_arch = "x86")]
#[allow(unused_unsafe)]
fn read_leaf1() -> Option<(u32, u32)> {
	// SAFETY: every processor Rust targets as `x86` (i586 and later) implements CPUID.
	let leaf = unsafe { std::arch::x86::__cpuid(1) };
	Some((leaf.ebx, leaf.edx))
}

#[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
fn read_leaf1() -> Option<(u32, u32)> {
	None
}

impl TopologyProbe for InstructionProbe {
	fn source(&self) -> ProbeSource {
		ProbeSource::Instruction
	}

	fn threads_per_unit(&self, _fs: &dyn SysfsAccess) -> Option<usize> {
		read_leaf1().map(|(ebx, edx)| decode_logical_count(ebx, edx))
	}
}
