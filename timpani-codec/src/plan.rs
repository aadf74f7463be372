//! Wire encoding of a `SchedInfo` reply: a node's slice of a workload's
//! scheduled tasks (spec §6).
//!
//! Tasks are appended to the buffer in insertion order, so the buffer's tail
//! holds the *last* task first. Decoding therefore walks the task list
//! backward and reverses the result to restore the original order — the
//! same "i = N-1 .. 0 on the wire" shape the original server produces.

use timpani_types::{SchedPolicy, TaskRecord};

use crate::buffer::{Decoder, Encoder};
use crate::error::CodecResult;

/// Encodes one [`TaskRecord`]'s ten fields, in the order listed in spec §6.
fn encode_task(enc: &mut Encoder, task: &TaskRecord) {
    enc.put_str(&task.name);
    enc.put_i32(task.priority as i32);
    enc.put_i32(task.policy.to_wire());
    enc.put_i32(task.period_us as i32);
    enc.put_i32(task.release_offset_us as i32);
    enc.put_i32(task.runtime_us as i32);
    enc.put_i32(task.deadline_us as i32);
    enc.put_i64(task.cpu_affinity as i64);
    enc.put_i32(task.max_allowed_deadline_misses as i32);
    enc.put_str(&task.assigned_node_id);
}

/// Reads back one task record written by [`encode_task`], field by field in
/// reverse.
fn decode_task(dec: &mut Decoder) -> CodecResult<TaskRecord> {
    let assigned_node_id = dec.get_str()?;
    let max_allowed_deadline_misses = dec.get_i32()? as u32;
    let cpu_affinity = dec.get_i64()? as u64;
    let deadline_us = dec.get_i32()? as u32;
    let runtime_us = dec.get_i32()? as u32;
    let release_offset_us = dec.get_i32()? as u32;
    let period_us = dec.get_i32()? as u32;
    let policy_wire = dec.get_i32()?;
    let policy = SchedPolicy::from_wire(policy_wire)
        .map_err(|_| crate::error::CodecError::UnknownDiscriminant(policy_wire))?;
    let priority = dec.get_i32()? as u32;
    let name = dec.get_str()?;

    Ok(TaskRecord {
        name,
        priority,
        policy,
        period_us,
        release_offset_us,
        runtime_us,
        deadline_us,
        cpu_affinity,
        max_allowed_deadline_misses,
        assigned_node_id,
    })
}

/// Encodes a `SchedInfo` reply: `tasks` in insertion order, then the task
/// count, the owning workload id, and the hyperperiod, each appended after
/// the last (spec §6). This is the buffer a node's `Register`/`SchedInfo`
/// RPC reply carries.
pub fn encode_sched_info(workload_id: &str, hyperperiod_us: u64, tasks: &[TaskRecord]) -> Vec<u8> {
    let mut enc = Encoder::new();
    for task in tasks {
        encode_task(&mut enc, task);
    }
    enc.put_i32(tasks.len() as i32);
    enc.put_str(workload_id);
    enc.put_i64(hyperperiod_us as i64);
    enc.into_bytes()
}

/// Decoded form of an [`encode_sched_info`] buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedSchedInfo {
    pub workload_id: String,
    pub hyperperiod_us: u64,
    pub tasks: Vec<TaskRecord>,
}

/// Decodes a buffer produced by [`encode_sched_info`], restoring the
/// original task insertion order.
pub fn decode_sched_info(bytes: &[u8]) -> CodecResult<DecodedSchedInfo> {
    let mut dec = Decoder::new(bytes);
    let hyperperiod_us = dec.get_i64()? as u64;
    let workload_id = dec.get_str()?;
    let task_count = dec.get_i32()? as usize;

    let mut tasks = Vec::with_capacity(task_count);
    for _ in 0..task_count {
        tasks.push(decode_task(&mut dec)?);
    }
    tasks.reverse();

    Ok(DecodedSchedInfo { workload_id, hyperperiod_us, tasks })
}
