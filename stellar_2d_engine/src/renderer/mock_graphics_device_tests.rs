//! Unit tests for the mock graphics device itself

use crate::error::Error;
use crate::renderer::mock_graphics_device::{MockCommand, MockCommandList, MockGraphicsDevice};
use crate::renderer::{Buffer, BufferDesc, CommandList, GraphicsDevice, IndexType};

#[test]
fn test_buffer_create_then_drop_leaves_no_live_allocation() {
    let device = MockGraphicsDevice::new();
    {
        let buffer = device.create_buffer(&BufferDesc::vertex(64)).unwrap();
        assert_eq!(buffer.size(), 64);
        assert_eq!(device.live_allocations(), 1);
    }
    assert_eq!(device.live_allocations(), 0);
    assert_eq!(device.total_allocations(), 1);
}

#[test]
fn test_zero_sized_buffer_is_argument_error_without_allocation() {
    let device = MockGraphicsDevice::new();
    let result = device.create_buffer(&BufferDesc::vertex(0));
    assert!(matches!(result, Err(Error::InvalidArgument(_))));
    assert_eq!(device.total_allocations(), 0);
}

#[test]
fn test_allocation_budget_produces_out_of_memory() {
    let device = MockGraphicsDevice::new();
    device.set_allocation_budget(Some(1));
    let first = device.create_buffer(&BufferDesc::index(12));
    assert!(first.is_ok());
    assert!(matches!(device.create_buffer(&BufferDesc::index(12)), Err(Error::OutOfMemory)));
    drop(first);
    assert_eq!(device.live_allocations(), 0);
}

#[test]
fn test_buffer_update_writes_and_bounds_checks() {
    let device = MockGraphicsDevice::new();
    let buffer = device.create_buffer(&BufferDesc::uniform(8)).unwrap();

    buffer.update(4, &[1, 2, 3, 4]).unwrap();
    assert_eq!(buffer.contents(), vec![0, 0, 0, 0, 1, 2, 3, 4]);

    assert!(buffer.update(6, &[1, 2, 3]).is_err());
}

#[test]
fn test_command_list_records_in_order() {
    let device = MockGraphicsDevice::new();
    let vertices = device.create_buffer(&BufferDesc::vertex(24)).unwrap();
    let indices = device.create_buffer(&BufferDesc::index(12)).unwrap();
    let mut cmd = MockCommandList::new();

    cmd.begin().unwrap();
    cmd.bind_vertex_buffers(0, &[&vertices]).unwrap();
    cmd.bind_index_buffer(&indices, IndexType::U32).unwrap();
    cmd.draw_indexed(3, 5).unwrap();
    cmd.end().unwrap();

    assert_eq!(cmd.commands.len(), 5);
    assert_eq!(cmd.commands[0], MockCommand::Begin);
    assert_eq!(
        cmd.commands[1],
        MockCommand::BindVertexBuffers { first_binding: 0, buffer_ids: vec![vertices.id] }
    );
    assert_eq!(cmd.draws(), vec![(3, 5)]);
}
